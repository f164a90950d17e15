// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the PostgreSQL implementation of the
//! [`ProjectRepository`]

use async_trait::async_trait;
use docstats_storage::project::ProjectRepository;
use sea_query::{Expr, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{DatabaseError, iden::Projects, to_count, tracing::ExecuteExt};

/// An implementation of [`ProjectRepository`] for a PostgreSQL connection
pub struct PgProjectRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgProjectRepository<'c> {
    /// Create a new [`PgProjectRepository`] from an active PostgreSQL
    /// connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.project.count",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn count(&mut self) -> Result<u64, Self::Error> {
        let (sql, arguments) = Query::select()
            .expr(Expr::col((Projects::Table, Projects::Id)).count())
            .from(Projects::Table)
            .build_sqlx(PostgresQueryBuilder);

        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        to_count(count)
    }
}
