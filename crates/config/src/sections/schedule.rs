// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::Error as _};

use super::ConfigurationSection;
use crate::schema;

const DEFAULT_STATISTICS_CRON: &str = "0 30 5 * * *";
const DEFAULT_DB_CLEANUP_CRON: &str = "0 0 6 * * *";

fn default_true() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_default_true(value: &bool) -> bool {
    *value
}

fn default_statistics() -> JobScheduleConfig {
    JobScheduleConfig::new(DEFAULT_STATISTICS_CRON)
}

fn default_db_cleanup() -> JobScheduleConfig {
    JobScheduleConfig::new(DEFAULT_DB_CLEANUP_CRON)
}

/// When a periodic job runs
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct JobScheduleConfig {
    /// Whether the job is scheduled at all
    #[serde(default = "default_true", skip_serializing_if = "is_default_true")]
    pub enabled: bool,

    /// Cron expression, evaluated in UTC
    #[schemars(with = "schema::CronExpression")]
    pub cron: String,
}

impl JobScheduleConfig {
    fn new(cron: &str) -> Self {
        Self {
            enabled: true,
            cron: cron.to_owned(),
        }
    }

    /// Parse the cron expression of this job. Returns `None` if the job is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the cron expression is invalid
    pub fn schedule(&self) -> Result<Option<cron::Schedule>, cron::error::Error> {
        if !self.enabled {
            return Ok(None);
        }

        cron::Schedule::from_str(&self.cron).map(Some)
    }
}

/// Configuration of the periodic jobs schedule
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// When to take the daily statistics snapshot
    #[serde(default = "default_statistics")]
    pub statistics: JobScheduleConfig,

    /// When to clean up expired sessions and old revisions
    #[serde(default = "default_db_cleanup")]
    pub db_cleanup: JobScheduleConfig,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            statistics: default_statistics(),
            db_cleanup: default_db_cleanup(),
        }
    }
}

impl ConfigurationSection for ScheduleConfig {
    const PATH: Option<&'static str> = Some("schedule");

    fn validate(
        &self,
        _figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        for (name, job) in [
            ("statistics", &self.statistics),
            ("db_cleanup", &self.db_cleanup),
        ] {
            if let Err(e) = cron::Schedule::from_str(&job.cron) {
                return Err(figment::error::Error::custom(format!(
                    "Invalid cron expression {:?}: {e}",
                    job.cron
                ))
                .with_path(&format!("{name}.cron"))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;
    use crate::ConfigurationSectionExt;

    #[test]
    fn defaults() {
        let config = ScheduleConfig::default();
        assert_eq!(config.statistics.cron, "0 30 5 * * *");
        assert_eq!(config.db_cleanup.cron, "0 0 6 * * *");
        assert!(config.statistics.schedule().unwrap().is_some());
        assert!(config.db_cleanup.schedule().unwrap().is_some());
    }

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    schedule:
                      statistics:
                        cron: '0 0 1 * * *'
                      db_cleanup:
                        enabled: false
                        cron: '0 0 6 * * *'
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config =
                ScheduleConfig::extract_or_default(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.statistics.cron, "0 0 1 * * *");
            assert!(config.statistics.enabled);
            assert!(config.db_cleanup.schedule().unwrap().is_none());

            Ok(())
        });
    }

    #[test]
    fn missing_jobs_use_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    schedule:
                      db_cleanup:
                        cron: '0 15 * * * *'
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config =
                ScheduleConfig::extract_or_default(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.statistics, default_statistics());
            assert_eq!(config.db_cleanup.cron, "0 15 * * * *");

            Ok(())
        });
    }

    #[test]
    fn reject_invalid_cron() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    schedule:
                      statistics:
                        cron: 'every day at dawn'
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let error = ScheduleConfig::extract_or_default(&figment).unwrap_err();
            assert!(error.to_string().contains("Invalid cron expression"));

            Ok(())
        });
    }
}
