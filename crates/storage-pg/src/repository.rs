// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use async_trait::async_trait;
use docstats_storage::{
    BoxRepository, MapErr, Repository, RepositoryAccess, RepositoryError,
    RepositoryFactory, RepositoryTransaction, document::DocumentRepository, note::NoteRepository,
    project::ProjectRepository, revision::RevisionRepository, session::SessionRepository,
    statistics::StatisticsRepository,
};
use futures_util::{FutureExt, TryFutureExt, future::BoxFuture};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::Instrument;

use crate::{
    DB_CLIENT_CONNECTIONS_CREATE_TIME_HISTOGRAM, DatabaseError, document::PgDocumentRepository,
    note::PgNoteRepository, project::PgProjectRepository, revision::PgRevisionRepository,
    session::PgSessionRepository, statistics::PgStatisticsRepository,
};

/// An implementation of the [`RepositoryFactory`] trait backed by a PostgreSQL
/// connection pool.
#[derive(Clone)]
pub struct PgRepositoryFactory {
    pool: PgPool,
}

impl PgRepositoryFactory {
    /// Create a new [`PgRepositoryFactory`] from a PostgreSQL connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RepositoryFactory for PgRepositoryFactory {
    async fn create(&self) -> Result<BoxRepository, RepositoryError> {
        let start = std::time::Instant::now();
        let repo = PgRepository::from_pool(&self.pool)
            .await
            .map_err(RepositoryError::from_error)?
            .boxed();

        // Measure the time it took to create the connection
        let duration = start.elapsed();
        let duration_ms = duration.as_millis().try_into().unwrap_or(u64::MAX);
        DB_CLIENT_CONNECTIONS_CREATE_TIME_HISTOGRAM.record(duration_ms, &[]);

        Ok(repo)
    }
}

/// An implementation of the [`Repository`] trait backed by a PostgreSQL
/// transaction.
pub struct PgRepository<C = Transaction<'static, Postgres>> {
    conn: C,
}

impl PgRepository {
    /// Create a new [`PgRepository`] from a PostgreSQL connection pool,
    /// starting a transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`DatabaseError`] if the transaction could not be started.
    pub async fn from_pool(pool: &PgPool) -> Result<Self, DatabaseError> {
        let txn = pool.begin().await?;
        Ok(Self::from_conn(txn))
    }

    /// Transform the repository into a type-erased [`BoxRepository`]
    pub fn boxed(self) -> BoxRepository {
        Box::new(MapErr::new(self, RepositoryError::from_error))
    }
}

impl<C> PgRepository<C> {
    /// Create a new [`PgRepository`] from an existing PostgreSQL connection
    /// with a transaction
    pub fn from_conn(conn: C) -> Self {
        PgRepository { conn }
    }
}

impl Repository<DatabaseError> for PgRepository {}

impl RepositoryTransaction for PgRepository {
    type Error = DatabaseError;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let span = tracing::info_span!("db.save");
        self.conn
            .commit()
            .map_err(DatabaseError::from)
            .instrument(span)
            .boxed()
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let span = tracing::info_span!("db.cancel");
        self.conn
            .rollback()
            .map_err(DatabaseError::from)
            .instrument(span)
            .boxed()
    }
}

impl<C> RepositoryAccess for PgRepository<C>
where
    C: AsMut<PgConnection> + Send,
{
    type Error = DatabaseError;

    fn document<'c>(&'c mut self) -> Box<dyn DocumentRepository<Error = Self::Error> + 'c> {
        Box::new(PgDocumentRepository::new(self.conn.as_mut()))
    }

    fn note<'c>(&'c mut self) -> Box<dyn NoteRepository<Error = Self::Error> + 'c> {
        Box::new(PgNoteRepository::new(self.conn.as_mut()))
    }

    fn project<'c>(&'c mut self) -> Box<dyn ProjectRepository<Error = Self::Error> + 'c> {
        Box::new(PgProjectRepository::new(self.conn.as_mut()))
    }

    fn statistics<'c>(&'c mut self) -> Box<dyn StatisticsRepository<Error = Self::Error> + 'c> {
        Box::new(PgStatisticsRepository::new(self.conn.as_mut()))
    }

    fn session<'c>(&'c mut self) -> Box<dyn SessionRepository<Error = Self::Error> + 'c> {
        Box::new(PgSessionRepository::new(self.conn.as_mut()))
    }

    fn revision<'c>(&'c mut self) -> Box<dyn RevisionRepository<Error = Self::Error> + 'c> {
        Box::new(PgRevisionRepository::new(self.conn.as_mut()))
    }
}
