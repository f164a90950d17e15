// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use docstats_config::{ConfigurationSection, WorkerConfig};
use docstats_storage::SystemClock;
use docstats_storage_pg::PgRepositoryFactory;
use docstats_tasks::{DbCleanupJob, RunnableJob, State, StoreStatisticsJob};
use figment::Figment;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};

use crate::util::{cleanup_settings_from_config, database_pool_from_config};

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Run a job once, ignoring its schedule
    Run {
        /// The job to run
        #[arg(value_enum)]
        job: JobName,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum JobName {
    /// Store a snapshot of yesterday's statistics
    Statistics,

    /// Delete expired sessions and old revisions
    DbCleanup,
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let Subcommand::Run { job } = self.subcommand;

        let span = info_span!("cli.job.run", ?job).entered();
        let config = WorkerConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;

        let runnable: Box<dyn RunnableJob> = match job {
            JobName::Statistics => Box::new(StoreStatisticsJob),
            JobName::DbCleanup => {
                Box::new(DbCleanupJob::new(cleanup_settings_from_config(&config.janitor)))
            }
        };

        info!("Connecting to the database");
        let pool = database_pool_from_config(&config.database).await?;
        let state = State::new(PgRepositoryFactory::new(pool), SystemClock::default());
        span.exit();

        // Interrupting asks the job to stop at its next checkpoint
        let cancellation_token = CancellationToken::new();
        let interrupt = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, asking the job to stop");
                interrupt.cancel();
            }
        });

        let result = docstats_tasks::run_once(&state, runnable.as_ref(), cancellation_token).await;

        // The outcome was already logged by the job runner
        Ok(if result.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
