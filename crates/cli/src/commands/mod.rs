// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};

mod config;
mod database;
mod job;
mod statistics;
mod worker;

#[derive(Parser, Debug)]
enum Subcommand {
    /// Configuration-related commands
    Config(self::config::Options),

    /// Manage the database
    Database(self::database::Options),

    /// Run the scheduled jobs (default)
    Worker(self::worker::Options),

    /// Run a single job right away
    Job(self::job::Options),

    /// Inspect the stored statistics
    Statistics(self::statistics::Options),
}

#[derive(Parser, Debug)]
#[command(version = crate::VERSION)]
pub struct Options {
    /// Path to the configuration file
    #[arg(short, long, global = true, action = clap::ArgAction::Append)]
    config: Vec<Utf8PathBuf>,

    #[command(subcommand)]
    subcommand: Option<Subcommand>,
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as S;
        match self.subcommand {
            Some(S::Config(c)) => c.run(figment).await,
            Some(S::Database(c)) => c.run(figment).await,
            Some(S::Worker(c)) => c.run(figment).await,
            Some(S::Job(c)) => c.run(figment).await,
            Some(S::Statistics(c)) => c.run(figment).await,
            None => self::worker::Options::default().run(figment).await,
        }
    }

    /// Get a [`Figment`] instance with the configuration loaded
    pub fn figment(&self) -> Figment {
        let configs = if self.config.is_empty() {
            // Read the DOCSTATS_CONFIG environment variable
            std::env::var("DOCSTATS_CONFIG")
                // Default to "config.yaml"
                .unwrap_or_else(|_| "config.yaml".to_owned())
                // Split the file list on `:`
                .split(':')
                .map(Utf8PathBuf::from)
                .collect()
        } else {
            self.config.clone()
        };

        // Files are merged in order, then the environment has the last word
        configs
            .into_iter()
            .fold(Figment::new(), |f, path| f.admerge(Yaml::file(path)))
            .merge(Env::prefixed("DOCSTATS_").ignore(&["config"]).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use docstats_config::{ConfigurationSection, WorkerConfig};
    use figment::Jail;

    use super::*;

    #[test]
    fn parse_commands() {
        let options = Options::try_parse_from(["docstats", "-c", "a.yaml", "-c", "b.yaml"]).unwrap();
        assert_eq!(options.config, [Utf8PathBuf::from("a.yaml"), "b.yaml".into()]);
        assert!(options.subcommand.is_none());

        let options =
            Options::try_parse_from(["docstats", "job", "run", "db-cleanup", "-c", "a.yaml"])
                .unwrap();
        assert!(matches!(options.subcommand, Some(Subcommand::Job(_))));
        assert_eq!(options.config.len(), 1);

        assert!(Options::try_parse_from(["docstats", "job", "run", "reindex"]).is_err());
    }

    #[test]
    fn later_files_and_environment_take_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "base.yaml",
                r"
                    janitor:
                      batch_size: 10
                      revision_retention_days: 30
                    schedule:
                      statistics:
                        cron: '0 0 1 * * *'
                ",
            )?;
            jail.create_file(
                "override.yaml",
                r"
                    janitor:
                      batch_size: 20
                ",
            )?;
            jail.set_env("DOCSTATS_SCHEDULE__STATISTICS__CRON", "0 0 2 * * *");

            let options = Options::try_parse_from([
                "docstats",
                "--config",
                "base.yaml",
                "--config",
                "override.yaml",
            ])
            .unwrap();
            let config =
                WorkerConfig::extract(&options.figment()).map_err(|e| e.to_string())?;

            assert_eq!(config.janitor.batch_size, 20);
            assert_eq!(config.janitor.revision_retention_days, 30);
            assert_eq!(config.schedule.statistics.cron, "0 0 2 * * *");

            Ok(())
        });
    }
}
