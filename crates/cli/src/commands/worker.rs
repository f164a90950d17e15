// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use clap::Parser;
use docstats_config::{ConfigurationSection, WorkerConfig};
use docstats_storage::SystemClock;
use docstats_storage_pg::PgRepositoryFactory;
use docstats_tasks::State;
use figment::Figment;
use tracing::{info, info_span};

use crate::{
    shutdown::ShutdownManager,
    util::{database_pool_from_config, worker_settings_from_config},
};

#[derive(Parser, Debug, Default)]
pub(super) struct Options {}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let shutdown = ShutdownManager::new()?;
        let span = info_span!("cli.worker.init").entered();
        let config = WorkerConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;
        let settings = worker_settings_from_config(&config.schedule, &config.janitor)?;

        // Connect to the database
        info!("Connecting to the database");
        let pool = database_pool_from_config(&config.database).await?;

        let state = State::new(PgRepositoryFactory::new(pool), SystemClock::default());

        info!(
            statistics = settings.statistics_schedule.is_some(),
            db_cleanup = settings.db_cleanup_schedule.is_some(),
            "Starting task scheduler"
        );
        docstats_tasks::init_and_run(
            state,
            settings,
            shutdown.soft_shutdown_token(),
            shutdown.task_tracker(),
        );
        span.exit();

        shutdown.run().await;

        Ok(ExitCode::SUCCESS)
    }
}
