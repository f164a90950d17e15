// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};

use crate::{
    State,
    job::{JobContext, RunnableJob, run_job},
};

struct ScheduleDefinition {
    name: &'static str,
    schedule: Schedule,
    job: Arc<dyn RunnableJob>,

    /// Set while a run triggered by this schedule is in progress
    running: Arc<AtomicBool>,
}

/// Clears the running flag of a schedule when dropped, including when the job
/// panics
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Triggers jobs following cron expressions, evaluated in UTC
pub struct Scheduler {
    state: State,
    schedules: Vec<ScheduleDefinition>,
    cancellation_token: CancellationToken,
    tracker: TaskTracker,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: State, cancellation_token: CancellationToken) -> Self {
        Self {
            state,
            schedules: Vec::new(),
            cancellation_token,
            tracker: TaskTracker::new(),
        }
    }

    /// Run the given job each time the schedule fires
    pub fn add_schedule(
        &mut self,
        name: &'static str,
        schedule: Schedule,
        job: impl RunnableJob,
    ) -> &mut Self {
        self.schedules.push(ScheduleDefinition {
            name,
            schedule,
            job: Arc::new(job),
            running: Arc::new(AtomicBool::new(false)),
        });

        self
    }

    /// Find the next time a schedule fires strictly after `after`, along
    /// with the index of every schedule firing at that time
    fn next_tick(&self, after: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<usize>)> {
        let mut next: Option<(DateTime<Utc>, Vec<usize>)> = None;

        for (index, definition) in self.schedules.iter().enumerate() {
            let Some(fire_at) = definition.schedule.after(&after).next() else {
                continue;
            };

            match &mut next {
                Some((at, due)) if *at == fire_at => due.push(index),
                Some((at, _)) if *at < fire_at => {}
                _ => next = Some((fire_at, vec![index])),
            }
        }

        next
    }

    fn trigger(&self, definition: &ScheduleDefinition, fire_at: DateTime<Utc>) {
        if definition.running.swap(true, Ordering::AcqRel) {
            warn!(
                schedule = definition.name,
                %fire_at,
                "Previous run is still in progress, skipping this one"
            );
            return;
        }

        let state = self.state.clone();
        let job = definition.job.clone();
        let guard = RunningGuard(definition.running.clone());
        let context = JobContext::new(
            definition.name,
            fire_at,
            self.cancellation_token.child_token(),
        );

        self.tracker.spawn(async move {
            let _guard = guard;
            // The outcome is logged by the runner
            let _ = run_job(&state, job.as_ref(), context).await;
        });
    }

    /// Run the scheduler until the cancellation token fires, then wait for the
    /// jobs in progress to finish
    #[tracing::instrument(name = "worker.run", skip_all)]
    pub async fn run(self) {
        info!(schedules = self.schedules.len(), "Starting the scheduler");

        let clock = self.state.clock();
        let mut cursor = clock.now();

        loop {
            let Some((fire_at, due)) = self.next_tick(cursor) else {
                warn!("No job left to schedule");
                break;
            };

            let wait = (fire_at - clock.now()).to_std().unwrap_or_default();
            debug!(%fire_at, ?wait, "Waiting for the next scheduled run");

            tokio::select! {
                () = self.cancellation_token.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }

            for index in due {
                self.trigger(&self.schedules[index], fire_at);
            }

            // If we woke up late, don't try to catch up with the missed runs
            cursor = fire_at.max(clock.now());
        }

        info!("Scheduler stopping, waiting for the running jobs");
        self.tracker.close();
        self.tracker.wait().await;
        info!("Scheduler stopped");
    }
}
