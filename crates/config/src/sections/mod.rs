// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod database;
mod janitor;
mod schedule;
mod telemetry;

pub use self::{
    database::{DatabaseConfig, PgSslMode},
    janitor::JanitorConfig,
    schedule::{JobScheduleConfig, ScheduleConfig},
    telemetry::{
        MetricsConfig, MetricsExporterKind, TelemetryConfig, TracingConfig, TracingExporterKind,
    },
};
use crate::util::ConfigurationSection;

/// Application configuration root
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RootConfig {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Configuration related to sending monitoring data
    #[serde(default, skip_serializing_if = "TelemetryConfig::is_default")]
    pub telemetry: TelemetryConfig,

    /// When the periodic jobs run
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Configuration of the database clean up job
    #[serde(default)]
    pub janitor: JanitorConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        self.database.validate(figment)?;
        self.telemetry.validate(figment)?;
        self.schedule.validate(figment)?;
        self.janitor.validate(figment)?;

        Ok(())
    }
}

/// Partial config used by the `docstats worker` and `docstats job` commands
#[allow(missing_docs)]
#[derive(Debug, Deserialize)]
pub struct WorkerConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub janitor: JanitorConfig,
}

impl ConfigurationSection for WorkerConfig {
    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        self.database.validate(figment)?;
        self.schedule.validate(figment)?;
        self.janitor.validate(figment)?;

        Ok(())
    }
}
