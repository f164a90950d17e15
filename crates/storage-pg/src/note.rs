// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the PostgreSQL implementation of the [`NoteRepository`]

use async_trait::async_trait;
use docstats_storage::note::{NoteFilter, NoteRepository};
use sea_query::{Expr, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{
    DatabaseError,
    filter::{Filter, StatementExt},
    iden::Notes,
    to_count,
    tracing::ExecuteExt,
};

/// An implementation of [`NoteRepository`] for a PostgreSQL connection
pub struct PgNoteRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgNoteRepository<'c> {
    /// Create a new [`PgNoteRepository`] from an active PostgreSQL connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl Filter for NoteFilter {
    fn generate_condition(&self) -> impl sea_query::IntoCondition {
        sea_query::Condition::all().add_option(
            self.access()
                .map(|access| Expr::col((Notes::Table, Notes::Access)).eq(access.as_i32())),
        )
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.note.count",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn count(&mut self, filter: NoteFilter) -> Result<u64, Self::Error> {
        let (sql, arguments) = Query::select()
            .expr(Expr::col((Notes::Table, Notes::Id)).count())
            .from(Notes::Table)
            .apply_filter(filter)
            .build_sqlx(PostgresQueryBuilder);

        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        to_count(count)
    }
}
