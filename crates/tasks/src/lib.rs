// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Scheduled jobs: the daily statistics snapshot and the database cleanup
//!
//! Jobs implement [`RunnableJob`]. They can either be run once with
//! [`run_once`], or be registered on a [`Scheduler`] which triggers them
//! following cron expressions.

use std::sync::{Arc, LazyLock};

use cron::Schedule;
use docstats_storage::{BoxRepository, Clock, RepositoryError, RepositoryFactory};
use opentelemetry::metrics::Meter;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

pub use crate::{
    cleanup::{CleanupSettings, DbCleanupJob},
    job::{JobContext, JobError, RunnableJob},
    scheduler::Scheduler,
    statistics::{StoreStatisticsJob, compute_snapshot},
};

mod cleanup;
mod job;
mod scheduler;
mod statistics;

static METER: LazyLock<Meter> = LazyLock::new(|| {
    let scope = opentelemetry::InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(opentelemetry_semantic_conventions::SCHEMA_URL)
        .build();

    opentelemetry::global::meter_with_scope(scope)
});

/// Everything a job needs to run
#[derive(Clone)]
pub struct State {
    repository_factory: Arc<dyn RepositoryFactory + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl State {
    pub fn new(
        repository_factory: impl RepositoryFactory + Send + Sync + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            repository_factory: Arc::new(repository_factory),
            clock: Arc::new(clock),
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        &self.clock
    }

    pub async fn repository(&self) -> Result<BoxRepository, RepositoryError> {
        self.repository_factory.create().await
    }
}

/// When the jobs should run
///
/// A job with no schedule is not registered on the worker.
#[derive(Debug, Clone, Default)]
pub struct WorkerSettings {
    pub statistics_schedule: Option<Schedule>,
    pub db_cleanup_schedule: Option<Schedule>,
    pub cleanup: CleanupSettings,
}

/// Initialise the worker, without running it.
///
/// This is mostly useful for tests.
#[must_use]
pub fn init(
    state: State,
    settings: WorkerSettings,
    cancellation_token: CancellationToken,
) -> Scheduler {
    let mut scheduler = Scheduler::new(state, cancellation_token);

    if let Some(schedule) = settings.statistics_schedule {
        scheduler.add_schedule("store-statistics", schedule, StoreStatisticsJob);
    }

    if let Some(schedule) = settings.db_cleanup_schedule {
        scheduler.add_schedule(
            "db-cleanup",
            schedule,
            DbCleanupJob::new(settings.cleanup),
        );
    }

    scheduler
}

/// Initialise the worker and run it on the given task tracker.
pub fn init_and_run(
    state: State,
    settings: WorkerSettings,
    cancellation_token: CancellationToken,
    task_tracker: &TaskTracker,
) {
    let scheduler = init(state, settings, cancellation_token);
    task_tracker.spawn(scheduler.run());
}

/// Run a single job right away, outside of any schedule
///
/// # Errors
///
/// Returns an error if the job failed or did not complete within its timeout
pub async fn run_once(
    state: &State,
    job: &dyn RunnableJob,
    cancellation_token: CancellationToken,
) -> Result<(), JobError> {
    let context = JobContext::new("manual", state.clock().now(), cancellation_token);
    job::run_job(state, job, context).await
}

#[cfg(test)]
mod test_utils {
    use std::sync::{Arc, Mutex};

    use docstats_storage::{clock::MockClock, memory::MemoryRepositoryFactory};
    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{Layer, layer::Context};

    use crate::State;

    /// A [`State`] backed by the in-memory storage and a mock clock
    pub(crate) fn state(factory: &MemoryRepositoryFactory, clock: Arc<MockClock>) -> State {
        State::new(factory.clone(), clock)
    }

    /// A tracing layer which records the level and message of every event
    #[derive(Clone, Default)]
    pub(crate) struct CapturedEvents(Arc<Mutex<Vec<(Level, String)>>>);

    impl CapturedEvents {
        pub(crate) fn messages(&self, level: Level) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, message)| message.clone())
                .collect()
        }
    }

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), visitor.0));
        }
    }
}
