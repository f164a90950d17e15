// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::Error as _};
use serde_with::serde_as;

use super::ConfigurationSection;

fn default_soft_time_limit() -> Duration {
    Duration::from_secs(29 * 60)
}

fn default_time_limit() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_revision_retention_days() -> u32 {
    180
}

fn default_batch_size() -> usize {
    1000
}

/// Configuration of the database clean up job
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct JanitorConfig {
    /// Time after which a clean up still running is stopped, in seconds. An
    /// error is logged and the run is still reported as successful.
    #[schemars(with = "u64")]
    #[serde(default = "default_soft_time_limit")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub soft_time_limit: Duration,

    /// Time after which a clean up is aborted, in seconds
    #[schemars(with = "u64")]
    #[serde(default = "default_time_limit")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub time_limit: Duration,

    /// Revisions older than this many days are deleted, along with their
    /// versions
    #[serde(default = "default_revision_retention_days")]
    #[schemars(range(min = 1))]
    pub revision_retention_days: u32,

    /// Number of rows deleted per transaction
    #[serde(default = "default_batch_size")]
    #[schemars(range(min = 1))]
    pub batch_size: usize,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            soft_time_limit: default_soft_time_limit(),
            time_limit: default_time_limit(),
            revision_retention_days: default_revision_retention_days(),
            batch_size: default_batch_size(),
        }
    }
}

impl ConfigurationSection for JanitorConfig {
    const PATH: Option<&'static str> = Some("janitor");

    fn validate(
        &self,
        _figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        if self.soft_time_limit >= self.time_limit {
            return Err(figment::error::Error::custom(
                "soft_time_limit must be lower than time_limit",
            )
            .with_path("soft_time_limit")
            .into());
        }

        if self.revision_retention_days == 0 {
            return Err(figment::error::Error::custom(
                "revision_retention_days must be greater than zero",
            )
            .with_path("revision_retention_days")
            .into());
        }

        if self.batch_size == 0 {
            return Err(
                figment::error::Error::custom("batch_size must be greater than zero")
                    .with_path("batch_size")
                    .into(),
            );
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
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    janitor:
                      soft_time_limit: 600
                      time_limit: 900
                      revision_retention_days: 30
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config =
                JanitorConfig::extract_or_default(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.soft_time_limit, Duration::from_secs(600));
            assert_eq!(config.time_limit, Duration::from_secs(900));
            assert_eq!(config.revision_retention_days, 30);
            assert_eq!(config.batch_size, 1000);

            Ok(())
        });
    }

    #[test]
    fn schema_describes_soft_limit() {
        let schema = serde_json::to_value(crate::root_schema()).unwrap();
        let description = schema["definitions"]["JanitorConfig"]["properties"]
            ["soft_time_limit"]["description"]
            .as_str()
            .unwrap();

        assert!(description.contains("is stopped"));
        assert!(description.contains("reported as successful"));
    }

    #[test]
    fn defaults() {
        let config = JanitorConfig::default();
        assert_eq!(config.soft_time_limit, Duration::from_secs(1740));
        assert_eq!(config.time_limit, Duration::from_secs(1800));
        assert_eq!(config.revision_retention_days, 180);
    }

    #[test]
    fn reject_soft_limit_above_hard_limit() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    janitor:
                      soft_time_limit: 1800
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(JanitorConfig::extract_or_default(&figment).is_err());

            Ok(())
        });
    }

    #[test]
    fn reject_zero_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    janitor:
                      batch_size: 0
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(JanitorConfig::extract_or_default(&figment).is_err());

            jail.create_file(
                "config.yaml",
                r"
                    janitor:
                      revision_retention_days: 0
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(JanitorConfig::extract_or_default(&figment).is_err());

            Ok(())
        });
    }
}
