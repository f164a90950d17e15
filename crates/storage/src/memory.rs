// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! An in-memory storage backend
//!
//! Each [`MemoryRepository`] reads from its own copy of the data. The writes it
//! makes are recorded and replayed on the shared state when the transaction is
//! saved, so concurrent transactions keep each other's writes. They are
//! discarded when it is cancelled or dropped. Aggregates are computed by
//! scanning the rows.
//!
//! The [`MemoryRepositoryFactory`] also has a few knobs to simulate a slow or
//! failing backend.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docstats_data_model::{
    Access, Document, Note, Project, Revision, Session, Statistics, StatisticsSnapshot, Status,
};
use futures_util::{FutureExt, future::BoxFuture};
use thiserror::Error;

use crate::{
    BoxRepository, Clock, MapErr, Repository, RepositoryAccess, RepositoryError,
    RepositoryFactory, RepositoryTransaction,
    document::{DocumentFilter, DocumentRepository},
    note::{NoteFilter, NoteRepository},
    project::ProjectRepository,
    revision::RevisionRepository,
    session::SessionRepository,
    statistics::StatisticsRepository,
};

/// Errors returned by the in-memory backend
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The backend was marked as unavailable
    #[error("the in-memory backend is unavailable")]
    Unavailable,

    /// A failure was injected for this operation
    #[error("injected failure in {0}")]
    Injected(&'static str),
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    documents: Vec<Document>,
    notes: Vec<Note>,
    projects: Vec<Project>,
    statistics: Vec<Statistics>,
    sessions: Vec<Session>,
    revisions: Vec<Revision>,
    /// The revision ID of each version row
    versions: Vec<i64>,
}

/// A write made by a transaction
#[derive(Debug)]
enum Write {
    AddStatistics(Statistics),
    DeleteSessions(HashSet<String>),
    DeleteRevisions(HashSet<i64>),
}

impl Write {
    fn apply(&self, state: &mut MemoryState) {
        match self {
            Self::AddStatistics(statistics) => state.statistics.push(statistics.clone()),
            Self::DeleteSessions(keys) => {
                state.sessions.retain(|session| !keys.contains(&session.key));
            }
            Self::DeleteRevisions(ids) => {
                state.revisions.retain(|revision| !ids.contains(&revision.id));
                state.versions.retain(|revision_id| !ids.contains(revision_id));
            }
        }
    }
}

#[derive(Debug, Default)]
struct Knobs {
    latency: Duration,
    unavailable: bool,
    failing: HashSet<&'static str>,
}

impl Knobs {
    fn check(&self, operation: &'static str) -> Result<(), MemoryError> {
        if self.failing.contains(operation) {
            return Err(MemoryError::Injected(operation));
        }

        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`RepositoryFactory`] backed by shared in-memory state
#[derive(Clone, Default)]
pub struct MemoryRepositoryFactory {
    state: Arc<Mutex<MemoryState>>,
    knobs: Arc<Mutex<Knobs>>,
    /// Last statistics ID handed out, shared by every transaction
    statistics_sequence: Arc<AtomicI64>,
}

impl MemoryRepositoryFactory {
    /// Create a new, empty, [`MemoryRepositoryFactory`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every new transaction wait for the given duration before starting
    pub fn set_latency(&self, latency: Duration) {
        lock(&self.knobs).latency = latency;
    }

    /// Make every new transaction fail to start
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.knobs).unavailable = unavailable;
    }

    /// Make the given operation fail, for example `"statistics.add"`
    ///
    /// Operations are named after the repository and the method, like in the
    /// tracing spans of the PostgreSQL backend.
    pub fn fail_on(&self, operation: &'static str) {
        lock(&self.knobs).failing.insert(operation);
    }

    /// Add a document, returning its ID
    pub fn add_document(
        &self,
        access: Access,
        status: Status,
        page_count: u32,
        user_id: i64,
        organization_id: i64,
    ) -> i64 {
        let mut state = lock(&self.state);
        let id = next_id(state.documents.iter().map(|d| d.id));
        state.documents.push(Document {
            id,
            access,
            status,
            page_count,
            user_id,
            organization_id,
        });
        id
    }

    /// Add a note on a document, returning its ID
    pub fn add_note(&self, document_id: i64, access: Access) -> i64 {
        let mut state = lock(&self.state);
        let id = next_id(state.notes.iter().map(|n| n.id));
        state.notes.push(Note {
            id,
            document_id,
            access,
        });
        id
    }

    /// Add a project, returning its ID
    pub fn add_project(&self, title: &str) -> i64 {
        let mut state = lock(&self.state);
        let id = next_id(state.projects.iter().map(|p| p.id));
        state.projects.push(Project {
            id,
            title: title.to_owned(),
        });
        id
    }

    /// Add a web session
    pub fn add_session(&self, key: &str, expires_at: DateTime<Utc>) {
        lock(&self.state).sessions.push(Session {
            key: key.to_owned(),
            expires_at,
        });
    }

    /// Add a revision with the given number of versions, returning its ID
    pub fn add_revision(&self, created_at: DateTime<Utc>, versions: usize) -> i64 {
        let mut state = lock(&self.state);
        let id = next_id(state.revisions.iter().map(|r| r.id));
        state.revisions.push(Revision { id, created_at });
        state.versions.extend(std::iter::repeat_n(id, versions));
        id
    }

    /// The stored statistics, in the order they were saved
    #[must_use]
    pub fn statistics(&self) -> Vec<Statistics> {
        lock(&self.state).statistics.clone()
    }

    /// The remaining web sessions
    #[must_use]
    pub fn sessions(&self) -> Vec<Session> {
        lock(&self.state).sessions.clone()
    }

    /// The remaining revisions
    #[must_use]
    pub fn revisions(&self) -> Vec<Revision> {
        lock(&self.state).revisions.clone()
    }

    /// The number of remaining version rows
    #[must_use]
    pub fn version_count(&self) -> usize {
        lock(&self.state).versions.len()
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    async fn create(&self) -> Result<BoxRepository, RepositoryError> {
        let (latency, unavailable) = {
            let knobs = lock(&self.knobs);
            (knobs.latency, knobs.unavailable)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if unavailable {
            return Err(RepositoryError::from_error(MemoryError::Unavailable));
        }

        Ok(MemoryRepository::new(self).boxed())
    }
}

/// An implementation of the [`Repository`] trait working on a copy of the
/// in-memory state
pub struct MemoryRepository {
    shared: Arc<Mutex<MemoryState>>,
    knobs: Arc<Mutex<Knobs>>,
    statistics_sequence: Arc<AtomicI64>,
    working: MemoryState,
    writes: Vec<Write>,
}

impl MemoryRepository {
    fn new(factory: &MemoryRepositoryFactory) -> Self {
        let working = lock(&factory.state).clone();
        Self {
            shared: factory.state.clone(),
            knobs: factory.knobs.clone(),
            statistics_sequence: factory.statistics_sequence.clone(),
            working,
            writes: Vec::new(),
        }
    }

    /// Transform the repository into a type-erased [`BoxRepository`]
    #[must_use]
    pub fn boxed(self) -> BoxRepository {
        Box::new(MapErr::new(self, RepositoryError::from_error))
    }
}

impl Repository<MemoryError> for MemoryRepository {}

impl RepositoryTransaction for MemoryRepository {
    type Error = MemoryError;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let this = *self;
        async move {
            let mut shared = lock(&this.shared);
            for write in &this.writes {
                write.apply(&mut shared);
            }
            Ok(())
        }
        .boxed()
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        async move { Ok(()) }.boxed()
    }
}

impl RepositoryAccess for MemoryRepository {
    type Error = MemoryError;

    fn document<'c>(&'c mut self) -> Box<dyn DocumentRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryTables::new(self))
    }

    fn note<'c>(&'c mut self) -> Box<dyn NoteRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryTables::new(self))
    }

    fn project<'c>(&'c mut self) -> Box<dyn ProjectRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryTables::new(self))
    }

    fn statistics<'c>(&'c mut self) -> Box<dyn StatisticsRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryTables::new(self))
    }

    fn session<'c>(&'c mut self) -> Box<dyn SessionRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryTables::new(self))
    }

    fn revision<'c>(&'c mut self) -> Box<dyn RevisionRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryTables::new(self))
    }
}

/// A borrowed view of the working copy, implementing every repository trait
struct MemoryTables<'c> {
    state: &'c mut MemoryState,
    writes: &'c mut Vec<Write>,
    knobs: &'c Mutex<Knobs>,
    statistics_sequence: &'c AtomicI64,
}

impl<'c> MemoryTables<'c> {
    fn new(repository: &'c mut MemoryRepository) -> Self {
        Self {
            state: &mut repository.working,
            writes: &mut repository.writes,
            knobs: &repository.knobs,
            statistics_sequence: &repository.statistics_sequence,
        }
    }

    /// Apply a write to the working copy, and record it for the save
    fn write(&mut self, write: Write) {
        write.apply(self.state);
        self.writes.push(write);
    }

    fn check(&self, operation: &'static str) -> Result<(), MemoryError> {
        lock(self.knobs).check(operation)
    }

    fn documents(&self, filter: DocumentFilter) -> impl Iterator<Item = &Document> {
        self.state.documents.iter().filter(move |document| {
            filter.access().is_none_or(|access| access == document.access)
                && filter.status().is_none_or(|status| status == document.status)
        })
    }
}

#[async_trait]
impl DocumentRepository for MemoryTables<'_> {
    type Error = MemoryError;

    async fn count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error> {
        self.check("document.count")?;
        Ok(self.documents(filter).count() as u64)
    }

    async fn sum_page_count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error> {
        self.check("document.sum_page_count")?;
        Ok(self
            .documents(filter)
            .map(|document| u64::from(document.page_count))
            .sum())
    }

    async fn count_distinct_users(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error> {
        self.check("document.count_distinct_users")?;
        let users: HashSet<i64> = self.documents(filter).map(|d| d.user_id).collect();
        Ok(users.len() as u64)
    }

    async fn count_distinct_organizations(
        &mut self,
        filter: DocumentFilter,
    ) -> Result<u64, Self::Error> {
        self.check("document.count_distinct_organizations")?;
        let organizations: HashSet<i64> =
            self.documents(filter).map(|d| d.organization_id).collect();
        Ok(organizations.len() as u64)
    }
}

#[async_trait]
impl NoteRepository for MemoryTables<'_> {
    type Error = MemoryError;

    async fn count(&mut self, filter: NoteFilter) -> Result<u64, Self::Error> {
        self.check("note.count")?;
        let count = self
            .state
            .notes
            .iter()
            .filter(|note| filter.access().is_none_or(|access| access == note.access))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl ProjectRepository for MemoryTables<'_> {
    type Error = MemoryError;

    async fn count(&mut self) -> Result<u64, Self::Error> {
        self.check("project.count")?;
        Ok(self.state.projects.len() as u64)
    }
}

#[async_trait]
impl StatisticsRepository for MemoryTables<'_> {
    type Error = MemoryError;

    async fn add(&mut self, snapshot: StatisticsSnapshot) -> Result<Statistics, Self::Error> {
        self.check("statistics.add")?;
        let id = self.statistics_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let statistics = Statistics { id, snapshot };
        self.write(Write::AddStatistics(statistics.clone()));
        Ok(statistics)
    }

    async fn list_recent(&mut self, limit: usize) -> Result<Vec<Statistics>, Self::Error> {
        self.check("statistics.list_recent")?;
        let mut recent = self.state.statistics.clone();
        recent.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        recent.truncate(limit);
        Ok(recent)
    }
}

#[async_trait]
impl SessionRepository for MemoryTables<'_> {
    type Error = MemoryError;

    async fn cleanup_expired(
        &mut self,
        clock: &dyn Clock,
        limit: usize,
    ) -> Result<usize, Self::Error> {
        self.check("session.cleanup_expired")?;
        let now = clock.now();
        let keys: HashSet<String> = self
            .state
            .sessions
            .iter()
            .filter(|session| session.is_expired(now))
            .take(limit)
            .map(|session| session.key.clone())
            .collect();
        let deleted = keys.len();
        self.write(Write::DeleteSessions(keys));
        Ok(deleted)
    }
}

#[async_trait]
impl RevisionRepository for MemoryTables<'_> {
    type Error = MemoryError;

    async fn cleanup_older_than(
        &mut self,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, Self::Error> {
        self.check("revision.cleanup_older_than")?;
        let ids: HashSet<i64> = self
            .state
            .revisions
            .iter()
            .filter(|revision| revision.created_at < until)
            .take(limit)
            .map(|revision| revision.id)
            .collect();
        let deleted = ids.len();
        self.write(Write::DeleteRevisions(ids));
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::clock::MockClock;

    #[tokio::test]
    async fn test_document_aggregates() {
        let factory = MemoryRepositoryFactory::new();
        factory.add_document(Access::Public, Status::Success, 10, 1, 100);
        factory.add_document(Access::Public, Status::Pending, 5, 1, 100);
        factory.add_document(Access::Private, Status::Success, 7, 2, 200);

        let mut repo = factory.create().await.unwrap();

        assert_eq!(repo.document().count(DocumentFilter::new()).await.unwrap(), 3);
        assert_eq!(
            repo.document()
                .count(DocumentFilter::new().with_access(Access::Public))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            repo.document()
                .count(
                    DocumentFilter::new()
                        .with_access(Access::Public)
                        .with_status(Status::Success)
                )
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.document()
                .sum_page_count(DocumentFilter::new())
                .await
                .unwrap(),
            22
        );
        assert_eq!(
            repo.document()
                .sum_page_count(DocumentFilter::new().with_access(Access::Invisible))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            repo.document()
                .count_distinct_users(DocumentFilter::new())
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            repo.document()
                .count_distinct_organizations(DocumentFilter::new().with_access(Access::Public))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_transactions() {
        let factory = MemoryRepositoryFactory::new();
        let snapshot = StatisticsSnapshot::default();

        // Cancelled transactions don't persist anything
        let mut repo = factory.create().await.unwrap();
        repo.statistics().add(snapshot.clone()).await.unwrap();
        repo.cancel().await.unwrap();
        assert!(factory.statistics().is_empty());

        // Neither do dropped ones
        let mut repo = factory.create().await.unwrap();
        repo.statistics().add(snapshot.clone()).await.unwrap();
        drop(repo);
        assert!(factory.statistics().is_empty());

        let mut repo = factory.create().await.unwrap();
        let first = repo.statistics().add(snapshot.clone()).await.unwrap();
        let second = repo.statistics().add(snapshot).await.unwrap();
        repo.save().await.unwrap();
        assert_ne!(first.id, second.id);

        let mut repo = factory.create().await.unwrap();
        let recent = repo.statistics().list_recent(1).await.unwrap();
        assert_eq!(recent, vec![second]);
    }

    #[tokio::test]
    async fn test_concurrent_transactions() {
        let factory = MemoryRepositoryFactory::new();
        let clock = MockClock::default();
        let now = clock.now();
        factory.add_session("expired", now - Duration::hours(1));
        factory.add_session("valid", now + Duration::hours(1));
        let old = factory.add_revision(now - Duration::days(200), 2);

        let mut first = factory.create().await.unwrap();
        let mut second = factory.create().await.unwrap();
        let mut third = factory.create().await.unwrap();

        let a = first
            .statistics()
            .add(StatisticsSnapshot::default())
            .await
            .unwrap();
        let b = second
            .statistics()
            .add(StatisticsSnapshot::default())
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(second.session().cleanup_expired(&clock, 10).await.unwrap(), 1);
        assert_eq!(
            third
                .revision()
                .cleanup_older_than(now - Duration::days(180), 10)
                .await
                .unwrap(),
            1
        );

        // Saved in a different order than they were started
        second.save().await.unwrap();
        third.save().await.unwrap();
        first.save().await.unwrap();

        let ids: HashSet<i64> = factory.statistics().iter().map(|s| s.id).collect();
        assert_eq!(ids, HashSet::from([a.id, b.id]));
        let sessions: Vec<String> = factory.sessions().into_iter().map(|s| s.key).collect();
        assert_eq!(sessions, vec!["valid".to_owned()]);
        assert!(factory.revisions().iter().all(|r| r.id != old));
        assert_eq!(factory.version_count(), 0);

        // The most recent statistics is the one with the highest ID
        let mut repo = factory.create().await.unwrap();
        let recent = repo.statistics().list_recent(1).await.unwrap();
        assert_eq!(recent[0].id, a.id.max(b.id));
    }

    #[tokio::test]
    async fn test_cleanup() {
        let factory = MemoryRepositoryFactory::new();
        let clock = MockClock::default();
        let now = clock.now();

        factory.add_session("expired-1", now - Duration::hours(1));
        factory.add_session("expired-2", now - Duration::days(3));
        factory.add_session("valid", now + Duration::hours(1));

        let old = factory.add_revision(now - Duration::days(200), 3);
        factory.add_revision(now - Duration::days(10), 2);

        let mut repo = factory.create().await.unwrap();
        assert_eq!(repo.session().cleanup_expired(&clock, 1).await.unwrap(), 1);
        assert_eq!(repo.session().cleanup_expired(&clock, 10).await.unwrap(), 1);
        assert_eq!(repo.session().cleanup_expired(&clock, 10).await.unwrap(), 0);
        assert_eq!(
            repo.revision()
                .cleanup_older_than(now - Duration::days(180), 10)
                .await
                .unwrap(),
            1
        );
        repo.save().await.unwrap();

        let sessions = factory.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].key, "valid");

        let revisions = factory.revisions();
        assert_eq!(revisions.len(), 1);
        assert_ne!(revisions[0].id, old);
        assert_eq!(factory.version_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let factory = MemoryRepositoryFactory::new();
        factory.fail_on("project.count");

        let mut repo = factory.create().await.unwrap();
        assert!(repo.project().count().await.is_err());
        assert_eq!(repo.note().count(NoteFilter::new()).await.unwrap(), 0);

        factory.set_unavailable(true);
        assert!(factory.create().await.is_err());
    }
}
