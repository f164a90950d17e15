// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use clap::Parser;
use docstats_config::{ConfigurationSectionExt, DatabaseConfig};
use docstats_storage::{RepositoryAccess, RepositoryFactory, RepositoryTransaction};
use docstats_storage_pg::PgRepositoryFactory;
use figment::Figment;
use tokio::io::AsyncWriteExt;
use tracing::{info, info_span};

use crate::util::database_pool_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Print the most recent snapshots as JSON lines, newest first
    List {
        /// How many snapshots to print
        #[arg(long, default_value_t = 7)]
        limit: usize,
    },
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let Subcommand::List { limit } = self.subcommand;

        let _span = info_span!("cli.statistics.list").entered();
        let config =
            DatabaseConfig::extract_or_default(figment).map_err(anyhow::Error::from_boxed)?;
        let pool = database_pool_from_config(&config).await?;

        let mut repo = PgRepositoryFactory::new(pool).create().await?;
        let snapshots = repo.statistics().list_recent(limit).await?;
        repo.cancel().await?;

        info!(count = snapshots.len(), "Listing statistics snapshots");

        let mut output = String::new();
        for snapshot in &snapshots {
            output.push_str(&serde_json::to_string(snapshot)?);
            output.push('\n');
        }

        tokio::io::stdout().write_all(output.as_bytes()).await?;

        Ok(ExitCode::SUCCESS)
    }
}
