// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The daily statistics snapshot

use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use docstats_data_model::{Access, StatisticsSnapshot, Status};
use docstats_storage::{
    Clock, RepositoryAccess,
    document::DocumentFilter,
    note::NoteFilter,
};
use opentelemetry::metrics::Counter;
use tracing::info;

use crate::{
    METER, State,
    job::{JobContext, JobError, RunnableJob},
};

static SNAPSHOTS_COUNTER: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("docstats.statistics.snapshots")
        .with_description("Number of statistics snapshots stored")
        .with_unit("{snapshot}")
        .build()
});

/// Compute the counters of a snapshot for the day before `clock.now()`
///
/// Every counter is the result of one aggregate query on the repository.
///
/// # Errors
///
/// Returns the error of the first query which fails
pub async fn compute_snapshot<R>(
    repo: &mut R,
    clock: &dyn Clock,
) -> Result<StatisticsSnapshot, R::Error>
where
    R: RepositoryAccess + ?Sized,
{
    let all = DocumentFilter::new();
    let public = all.with_access(Access::Public);
    let organization = all.with_access(Access::Organization);
    let private = all.with_access(Access::Private);
    let invisible = all.with_access(Access::Invisible);
    let status = |status| all.with_status(status);

    let mut documents = repo.document();
    let mut snapshot = StatisticsSnapshot {
        date: StatisticsSnapshot::date_for_run(clock.now()),

        total_documents: documents.count(all).await?,
        total_documents_public: documents.count(public).await?,
        total_documents_organization: documents.count(organization).await?,
        total_documents_private: documents.count(private).await?,
        total_documents_invisible: documents.count(invisible).await?,

        total_documents_success: documents.count(status(Status::Success)).await?,
        total_documents_readable: documents.count(status(Status::Readable)).await?,
        total_documents_pending: documents.count(status(Status::Pending)).await?,
        total_documents_error: documents.count(status(Status::Error)).await?,
        total_documents_nofile: documents.count(status(Status::Nofile)).await?,
        total_documents_deleted: documents.count(status(Status::Deleted)).await?,

        total_pages: documents.sum_page_count(all).await?,
        total_pages_public: documents.sum_page_count(public).await?,
        total_pages_organization: documents.sum_page_count(organization).await?,
        total_pages_private: documents.sum_page_count(private).await?,
        total_pages_invisible: documents.sum_page_count(invisible).await?,

        // There are no uploader counters for invisible documents
        total_users_uploaded: documents.count_distinct_users(all).await?,
        total_users_public_uploaded: documents.count_distinct_users(public).await?,
        total_users_private_uploaded: documents.count_distinct_users(private).await?,
        total_users_organization_uploaded: documents.count_distinct_users(organization).await?,

        total_organizations_uploaded: documents.count_distinct_organizations(all).await?,
        total_organizations_public_uploaded: documents
            .count_distinct_organizations(public)
            .await?,
        total_organizations_private_uploaded: documents
            .count_distinct_organizations(private)
            .await?,
        total_organizations_organization_uploaded: documents
            .count_distinct_organizations(organization)
            .await?,

        ..StatisticsSnapshot::default()
    };
    drop(documents);

    let mut notes = repo.note();
    let all = NoteFilter::new();
    snapshot.total_notes = notes.count(all).await?;
    snapshot.total_notes_public = notes.count(all.with_access(Access::Public)).await?;
    snapshot.total_notes_organization = notes.count(all.with_access(Access::Organization)).await?;
    snapshot.total_notes_private = notes.count(all.with_access(Access::Private)).await?;
    snapshot.total_notes_invisible = notes.count(all.with_access(Access::Invisible)).await?;
    drop(notes);

    snapshot.total_projects = repo.project().count().await?;

    Ok(snapshot)
}

/// Store a snapshot of the platform's aggregate counters
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStatisticsJob;

#[async_trait]
impl RunnableJob for StoreStatisticsJob {
    fn name(&self) -> &'static str {
        "store-statistics"
    }

    #[tracing::instrument(name = "job.store_statistics", skip_all)]
    async fn run(&self, state: &State, _context: JobContext) -> Result<(), JobError> {
        let clock = state.clock();
        let mut repo = state.repository().await.map_err(JobError::fail)?;

        // If anything fails, the transaction gets dropped without being saved
        let snapshot = compute_snapshot(&mut *repo, clock)
            .await
            .map_err(JobError::fail)?;
        let statistics = repo
            .statistics()
            .add(snapshot)
            .await
            .map_err(JobError::fail)?;
        repo.save().await.map_err(JobError::fail)?;

        SNAPSHOTS_COUNTER.add(1, &[]);
        info!(
            statistics.id = statistics.id,
            statistics.date = %statistics.snapshot.date,
            statistics.total_documents = statistics.snapshot.total_documents,
            "Stored statistics snapshot"
        );

        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(30 * 60))
    }
}
