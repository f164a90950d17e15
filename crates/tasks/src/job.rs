// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opentelemetry::{
    Key, KeyValue,
    metrics::{Histogram, UpDownCounter},
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{METER, State};

const JOB_NAME: Key = Key::from_static_str("job.name");
const JOB_STATUS: Key = Key::from_static_str("job.status");

static JOB_RUN_DURATION: LazyLock<Histogram<u64>> = LazyLock::new(|| {
    METER
        .u64_histogram("job.run.duration")
        .with_description("The time it took to run a job")
        .with_unit("ms")
        .build()
});

static JOB_RUN_ACTIVE: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    METER
        .i64_up_down_counter("job.run.active")
        .with_description("The number of jobs currently running")
        .with_unit("{job}")
        .build()
});

/// Information about the current run, passed to [`RunnableJob::run`]
#[derive(Debug, Clone)]
pub struct JobContext {
    /// The name of the schedule which triggered the run
    pub schedule: &'static str,

    /// When the run was triggered
    pub started_at: DateTime<Utc>,

    /// Cancelled when the worker shuts down. Long-running jobs should stop
    /// between two units of work when it fires.
    pub cancellation_token: CancellationToken,
}

impl JobContext {
    pub(crate) fn new(
        schedule: &'static str,
        started_at: DateTime<Utc>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            schedule,
            started_at,
            cancellation_token,
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job failed to run")]
    Failed(#[source] anyhow::Error),

    #[error("Job did not complete within {0:?}")]
    TimedOut(Duration),
}

impl JobError {
    pub fn fail<T: Into<anyhow::Error>>(error: T) -> Self {
        Self::Failed(error.into())
    }
}

#[async_trait]
pub trait RunnableJob: Send + Sync + 'static {
    /// A stable name for the job, used in logs and metrics
    fn name(&self) -> &'static str;

    async fn run(&self, state: &State, context: JobContext) -> Result<(), JobError>;

    /// The maximum time the job is allowed to run. The run is aborted and
    /// reported as failed when it elapses.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Run a job, enforcing its timeout and recording the outcome
///
/// There are no retries: a failed run is reported, and the job will run again
/// on its next trigger.
pub(crate) async fn run_job(
    state: &State,
    job: &dyn RunnableJob,
    context: JobContext,
) -> Result<(), JobError> {
    let name = job.name();
    let span = tracing::info_span!(
        "job.run",
        "otel.kind" = "consumer",
        "otel.status_code" = tracing::field::Empty,
        "job.name" = name,
        "job.schedule" = context.schedule,
    );

    let name_attr = KeyValue::new(JOB_NAME, name);
    JOB_RUN_ACTIVE.add(1, std::slice::from_ref(&name_attr));
    let start = std::time::Instant::now();

    let result = async {
        match job.timeout() {
            Some(timeout) => tokio::time::timeout(timeout, job.run(state, context))
                .await
                .unwrap_or(Err(JobError::TimedOut(timeout))),
            None => job.run(state, context).await,
        }
    }
    .instrument(span.clone())
    .await;

    let duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
    JOB_RUN_ACTIVE.add(-1, std::slice::from_ref(&name_attr));

    let status = match &result {
        Ok(()) => {
            span.record("otel.status_code", "OK");
            tracing::info!(parent: &span, job.duration_ms = duration_ms, "Job completed");
            "success"
        }
        Err(e) => {
            span.record("otel.status_code", "ERROR");
            tracing::error!(
                parent: &span,
                error = e as &dyn std::error::Error,
                job.duration_ms = duration_ms,
                "Job failed"
            );
            "error"
        }
    };

    JOB_RUN_DURATION.record(duration_ms, &[name_attr, KeyValue::new(JOB_STATUS, status)]);

    result
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use docstats_storage::{clock::MockClock, memory::MemoryRepositoryFactory};

    use super::*;
    use crate::test_utils;

    struct SlowJob {
        runs: Arc<AtomicUsize>,
        duration: Duration,
    }

    #[async_trait]
    impl RunnableJob for SlowJob {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn run(&self, _state: &State, _context: JobContext) -> Result<(), JobError> {
            tokio::time::sleep(self.duration).await;
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_secs(60))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_timeout() {
        let factory = MemoryRepositoryFactory::new();
        let state = test_utils::state(&factory, Arc::new(MockClock::default()));
        let runs = Arc::new(AtomicUsize::new(0));

        let job = SlowJob {
            runs: runs.clone(),
            duration: Duration::from_secs(30),
        };
        let context = JobContext::new("test", state.clock().now(), CancellationToken::new());
        run_job(&state, &job, context).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Past the timeout, the job future gets dropped before completing
        let job = SlowJob {
            runs: runs.clone(),
            duration: Duration::from_secs(120),
        };
        let context = JobContext::new("test", state.clock().now(), CancellationToken::new());
        let err = run_job(&state, &job, context).await.unwrap_err();
        assert!(matches!(err, JobError::TimedOut(d) if d == Duration::from_secs(60)));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
