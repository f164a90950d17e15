// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Database cleanup
//!
//! Purges the expired web sessions and the old revision history, in batches,
//! within a soft time limit.

use std::time::Duration;

use async_trait::async_trait;
use docstats_storage::RepositoryAccess;
use tracing::{debug, error, info};

use crate::{
    State,
    job::{JobContext, JobError, RunnableJob},
};

/// Tunables of the [`DbCleanupJob`]
#[derive(Debug, Clone)]
pub struct CleanupSettings {
    /// Past this, the cleanup stops where it stands and the run still succeeds
    pub soft_time_limit: Duration,

    /// Past this, the run is aborted and reported as failed
    pub time_limit: Duration,

    /// Revisions older than this are deleted
    pub revision_retention: chrono::Duration,

    /// Number of rows deleted per transaction
    pub batch_size: usize,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            soft_time_limit: Duration::from_secs(29 * 60),
            time_limit: Duration::from_secs(30 * 60),
            revision_retention: chrono::Duration::days(180),
            batch_size: 1000,
        }
    }
}

/// Purge expired sessions and old revisions
#[derive(Debug, Clone, Default)]
pub struct DbCleanupJob {
    settings: CleanupSettings,
}

impl DbCleanupJob {
    #[must_use]
    pub fn new(settings: CleanupSettings) -> Self {
        Self { settings }
    }

    async fn cleanup_expired_sessions(
        &self,
        state: &State,
        context: &JobContext,
    ) -> Result<(), JobError> {
        let clock = state.clock();
        let batch_size = self.settings.batch_size;
        let mut total = 0;

        // Each batch is committed on its own, so an interrupted run keeps
        // what it already deleted
        while !context.cancellation_token.is_cancelled() {
            let mut repo = state.repository().await.map_err(JobError::fail)?;
            let count = repo
                .session()
                .cleanup_expired(clock, batch_size)
                .await
                .map_err(JobError::fail)?;
            repo.save().await.map_err(JobError::fail)?;

            total += count;
            debug!(count, total, "deleted a batch of expired sessions");

            if count != batch_size {
                break;
            }
        }

        if total == 0 {
            debug!("no expired sessions to clean up");
        } else {
            info!(count = total, "cleaned up expired sessions");
        }

        Ok(())
    }

    async fn cleanup_old_revisions(
        &self,
        state: &State,
        context: &JobContext,
    ) -> Result<(), JobError> {
        let until = state.clock().now() - self.settings.revision_retention;
        let batch_size = self.settings.batch_size;
        let mut total = 0;

        while !context.cancellation_token.is_cancelled() {
            let mut repo = state.repository().await.map_err(JobError::fail)?;
            let count = repo
                .revision()
                .cleanup_older_than(until, batch_size)
                .await
                .map_err(JobError::fail)?;
            repo.save().await.map_err(JobError::fail)?;

            total += count;
            debug!(count, total, %until, "deleted a batch of old revisions");

            if count != batch_size {
                break;
            }
        }

        if total == 0 {
            debug!(%until, "no old revisions to clean up");
        } else {
            info!(count = total, %until, "cleaned up old revisions");
        }

        Ok(())
    }
}

#[async_trait]
impl RunnableJob for DbCleanupJob {
    fn name(&self) -> &'static str {
        "db-cleanup"
    }

    #[tracing::instrument(name = "job.db_cleanup", skip_all)]
    async fn run(&self, state: &State, context: JobContext) -> Result<(), JobError> {
        info!("Starting DB clean up");

        let work = async {
            self.cleanup_expired_sessions(state, &context).await?;
            self.cleanup_old_revisions(state, &context).await
        };

        // Dropping the work future rolls back the batch in flight
        match tokio::time::timeout(self.settings.soft_time_limit, work).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                error!(
                    soft_time_limit = ?self.settings.soft_time_limit,
                    "DB clean up took too long"
                );
            }
        }

        info!("Ending DB clean up");
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.settings.time_limit)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;
    use docstats_storage::{Clock, clock::MockClock, memory::MemoryRepositoryFactory};
    use tokio_util::sync::CancellationToken;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::{
        run_once,
        test_utils::{self, CapturedEvents},
    };

    fn seed(factory: &MemoryRepositoryFactory, clock: &MockClock) {
        let now = clock.now();
        factory.add_session("expired", now - ChronoDuration::hours(1));
        factory.add_session("valid", now + ChronoDuration::days(1));
        factory.add_revision(now - ChronoDuration::days(181), 3);
        factory.add_revision(now - ChronoDuration::days(179), 2);
    }

    #[tokio::test]
    async fn test_cleanup_within_budget() {
        let captured = CapturedEvents::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(captured.clone()));

        let factory = MemoryRepositoryFactory::new();
        let clock = Arc::new(MockClock::default());
        seed(&factory, &clock);
        let state = test_utils::state(&factory, clock.clone());

        run_once(&state, &DbCleanupJob::default(), CancellationToken::new())
            .await
            .unwrap();

        let sessions = factory.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].key, "valid");

        // Only the revision past the retention period goes, with its versions
        let revisions = factory.revisions();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].created_at, clock.now() - ChronoDuration::days(179));
        assert_eq!(factory.version_count(), 2);

        let info = captured.messages(Level::INFO);
        assert!(info.iter().any(|m| m == "Starting DB clean up"));
        assert!(info.iter().any(|m| m == "Ending DB clean up"));
        assert!(captured.messages(Level::ERROR).is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_in_batches() {
        let factory = MemoryRepositoryFactory::new();
        let clock = Arc::new(MockClock::default());
        let now = clock.now();
        for i in 0..7 {
            factory.add_session(&format!("session-{i}"), now - ChronoDuration::minutes(i + 1));
            factory.add_revision(now - ChronoDuration::days(365 + i), 1);
        }
        let state = test_utils::state(&factory, clock);

        let job = DbCleanupJob::new(CleanupSettings {
            batch_size: 3,
            ..CleanupSettings::default()
        });
        run_once(&state, &job, CancellationToken::new())
            .await
            .unwrap();

        assert!(factory.sessions().is_empty());
        assert!(factory.revisions().is_empty());
        assert_eq!(factory.version_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let factory = MemoryRepositoryFactory::new();
        let clock = Arc::new(MockClock::default());
        seed(&factory, &clock);
        let state = test_utils::state(&factory, clock);

        let cancellation_token = CancellationToken::new();
        cancellation_token.cancel();
        run_once(&state, &DbCleanupJob::default(), cancellation_token)
            .await
            .unwrap();

        assert_eq!(factory.sessions().len(), 2);
        assert_eq!(factory.revisions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_soft_time_limit() {
        let captured = CapturedEvents::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(captured.clone()));

        let factory = MemoryRepositoryFactory::new();
        let clock = Arc::new(MockClock::default());
        seed(&factory, &clock);
        let state = test_utils::state(&factory, clock);

        // Each transaction takes 1000 seconds to start: the sessions get
        // purged, and the soft limit elapses while waiting for the second one
        factory.set_latency(std::time::Duration::from_secs(1000));

        run_once(&state, &DbCleanupJob::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(factory.sessions().len(), 1);
        assert_eq!(factory.revisions().len(), 2);

        assert_eq!(
            captured.messages(Level::ERROR),
            vec!["DB clean up took too long".to_owned()]
        );
        assert!(
            captured
                .messages(Level::INFO)
                .iter()
                .any(|m| m == "Ending DB clean up")
        );
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let factory = MemoryRepositoryFactory::new();
        let clock = Arc::new(MockClock::default());
        seed(&factory, &clock);
        factory.fail_on("revision.cleanup_older_than");
        let state = test_utils::state(&factory, clock);

        let result = run_once(&state, &DbCleanupJob::default(), CancellationToken::new()).await;
        assert!(matches!(result, Err(JobError::Failed(_))));

        // The sessions batch was already committed
        assert_eq!(factory.sessions().len(), 1);
        assert_eq!(factory.revisions().len(), 2);
    }
}
