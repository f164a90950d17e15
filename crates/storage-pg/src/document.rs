// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the PostgreSQL implementation of the
//! [`DocumentRepository`]

use async_trait::async_trait;
use docstats_storage::document::{DocumentFilter, DocumentRepository};
use sea_query::{Alias, Expr, Func, PostgresQueryBuilder, Query, SimpleExpr};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{
    DatabaseError,
    filter::{Filter, StatementExt},
    iden::Documents,
    to_count,
    tracing::ExecuteExt,
};

/// An implementation of [`DocumentRepository`] for a PostgreSQL connection
pub struct PgDocumentRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgDocumentRepository<'c> {
    /// Create a new [`PgDocumentRepository`] from an active PostgreSQL
    /// connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Run a single-row aggregate over the documents matching the filter
    async fn aggregate(
        &mut self,
        aggregate: SimpleExpr,
        filter: DocumentFilter,
    ) -> Result<u64, DatabaseError> {
        let (sql, arguments) = Query::select()
            .expr(aggregate)
            .from(Documents::Table)
            .apply_filter(filter)
            .build_sqlx(PostgresQueryBuilder);

        let value: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        to_count(value)
    }
}

impl Filter for DocumentFilter {
    fn generate_condition(&self) -> impl sea_query::IntoCondition {
        sea_query::Condition::all()
            .add_option(self.access().map(|access| {
                Expr::col((Documents::Table, Documents::Access)).eq(access.as_i32())
            }))
            .add_option(self.status().map(|status| {
                Expr::col((Documents::Table, Documents::Status)).eq(status.as_i32())
            }))
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.document.count",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error> {
        self.aggregate(Expr::col((Documents::Table, Documents::Id)).count(), filter)
            .await
    }

    #[tracing::instrument(
        name = "db.document.sum_page_count",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn sum_page_count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error> {
        // SUM returns NULL on an empty set, and a NUMERIC on BIGINT columns
        let sum = Func::cast_as(
            Func::coalesce([
                Func::sum(Expr::col((Documents::Table, Documents::PageCount))).into(),
                Expr::val(0).into(),
            ]),
            Alias::new("BIGINT"),
        );

        self.aggregate(sum.into(), filter).await
    }

    #[tracing::instrument(
        name = "db.document.count_distinct_users",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn count_distinct_users(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error> {
        self.aggregate(
            Func::count_distinct(Expr::col((Documents::Table, Documents::UserId))).into(),
            filter,
        )
        .await
    }

    #[tracing::instrument(
        name = "db.document.count_distinct_organizations",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn count_distinct_organizations(
        &mut self,
        filter: DocumentFilter,
    ) -> Result<u64, Self::Error> {
        self.aggregate(
            Func::count_distinct(Expr::col((Documents::Table, Documents::OrganizationId))).into(),
            filter,
        )
        .await
    }
}
