// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use anyhow::Context;
use docstats_config::{DatabaseConfig, JanitorConfig, PgSslMode, ScheduleConfig};
use docstats_tasks::{CleanupSettings, WorkerSettings};
use sqlx::{
    ConnectOptions, PgConnection,
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
};
use tracing::log::LevelFilter;

fn database_connect_options_from_config(
    config: &DatabaseConfig,
) -> Result<PgConnectOptions, anyhow::Error> {
    let options = if let Some(uri) = config.uri.as_deref() {
        uri.parse()
            .context("could not parse database connection string")?
    } else {
        let mut opts = PgConnectOptions::new().application_name("docstats");

        if let Some(host) = config.host.as_deref() {
            opts = opts.host(host);
        }

        if let Some(port) = config.port {
            opts = opts.port(port);
        }

        if let Some(socket) = config.socket.as_deref() {
            opts = opts.socket(socket);
        }

        if let Some(username) = config.username.as_deref() {
            opts = opts.username(username);
        }

        if let Some(password) = config.password.as_deref() {
            opts = opts.password(password);
        }

        if let Some(database) = config.database.as_deref() {
            opts = opts.database(database);
        }

        opts
    };

    let options = match config.ssl_mode {
        Some(ssl_mode) => {
            let ssl_mode = match ssl_mode {
                PgSslMode::Disable => sqlx::postgres::PgSslMode::Disable,
                PgSslMode::Allow => sqlx::postgres::PgSslMode::Allow,
                PgSslMode::Prefer => sqlx::postgres::PgSslMode::Prefer,
                PgSslMode::Require => sqlx::postgres::PgSslMode::Require,
                PgSslMode::VerifyCa => sqlx::postgres::PgSslMode::VerifyCa,
                PgSslMode::VerifyFull => sqlx::postgres::PgSslMode::VerifyFull,
            };

            options.ssl_mode(ssl_mode)
        }
        None => options,
    };

    Ok(options
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500)))
}

/// Create a database connection pool from the configuration
#[tracing::instrument(name = "db.connect", skip_all)]
pub async fn database_pool_from_config(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    let options = database_connect_options_from_config(config)?;
    PgPoolOptions::new()
        .max_connections(config.max_connections.into())
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_with(options)
        .await
        .context("could not connect to the database")
}

/// Create a single database connection from the configuration
#[tracing::instrument(name = "db.connect", skip_all)]
pub async fn database_connection_from_config(
    config: &DatabaseConfig,
) -> Result<PgConnection, anyhow::Error> {
    database_connect_options_from_config(config)?
        .connect()
        .await
        .context("could not connect to the database")
}

/// Build the settings of the job runner from the configuration
pub fn worker_settings_from_config(
    schedule: &ScheduleConfig,
    janitor: &JanitorConfig,
) -> Result<WorkerSettings, anyhow::Error> {
    let statistics_schedule = schedule
        .statistics
        .schedule()
        .context("invalid statistics schedule")?;
    let db_cleanup_schedule = schedule
        .db_cleanup
        .schedule()
        .context("invalid database cleanup schedule")?;

    Ok(WorkerSettings {
        statistics_schedule,
        db_cleanup_schedule,
        cleanup: cleanup_settings_from_config(janitor),
    })
}

pub fn cleanup_settings_from_config(config: &JanitorConfig) -> CleanupSettings {
    CleanupSettings {
        soft_time_limit: config.soft_time_limit,
        time_limit: config.time_limit,
        revision_retention: chrono::Duration::days(i64::from(config.revision_retention_days)),
        batch_size: config.batch_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings =
            worker_settings_from_config(&ScheduleConfig::default(), &JanitorConfig::default())
                .unwrap();

        assert!(settings.statistics_schedule.is_some());
        assert!(settings.db_cleanup_schedule.is_some());
        assert_eq!(settings.cleanup.soft_time_limit, Duration::from_secs(1740));
        assert_eq!(settings.cleanup.time_limit, Duration::from_secs(1800));
        assert_eq!(settings.cleanup.revision_retention.num_days(), 180);
        assert_eq!(settings.cleanup.batch_size, 1000);
    }

    #[test]
    fn disabled_jobs_are_not_scheduled() {
        let mut schedule = ScheduleConfig::default();
        schedule.statistics.enabled = false;

        let settings = worker_settings_from_config(&schedule, &JanitorConfig::default()).unwrap();
        assert!(settings.statistics_schedule.is_none());
        assert!(settings.db_cleanup_schedule.is_some());
    }

    #[test]
    fn connection_options_from_split_config() {
        let config = DatabaseConfig {
            uri: None,
            host: Some("db.example.com".to_owned()),
            port: Some(5433),
            username: Some("docstats".to_owned()),
            database: Some("platform".to_owned()),
            ..DatabaseConfig::default()
        };

        let options = database_connect_options_from_config(&config).unwrap();
        assert_eq!(options.get_host(), "db.example.com");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "docstats");
        assert_eq!(options.get_database(), Some("platform"));
    }
}
