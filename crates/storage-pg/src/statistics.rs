// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the PostgreSQL implementation of the
//! [`StatisticsRepository`]

use async_trait::async_trait;
use chrono::NaiveDate;
use docstats_data_model::{Statistics, StatisticsSnapshot};
use docstats_storage::statistics::StatisticsRepository;
use sea_query::{Alias, Expr, Order, PostgresQueryBuilder, Query, SimpleExpr};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{DatabaseError, iden::DailyStatistics, tracing::ExecuteExt};

/// An implementation of [`StatisticsRepository`] for a PostgreSQL connection
pub struct PgStatisticsRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgStatisticsRepository<'c> {
    /// Create a new [`PgStatisticsRepository`] from an active PostgreSQL
    /// connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

/// The counter columns, in the same order as [`counter_values`]
const COUNTER_COLUMNS: [DailyStatistics; 30] = [
    DailyStatistics::TotalDocuments,
    DailyStatistics::TotalDocumentsPublic,
    DailyStatistics::TotalDocumentsOrganization,
    DailyStatistics::TotalDocumentsPrivate,
    DailyStatistics::TotalDocumentsInvisible,
    DailyStatistics::TotalDocumentsSuccess,
    DailyStatistics::TotalDocumentsReadable,
    DailyStatistics::TotalDocumentsPending,
    DailyStatistics::TotalDocumentsError,
    DailyStatistics::TotalDocumentsNofile,
    DailyStatistics::TotalDocumentsDeleted,
    DailyStatistics::TotalPages,
    DailyStatistics::TotalPagesPublic,
    DailyStatistics::TotalPagesOrganization,
    DailyStatistics::TotalPagesPrivate,
    DailyStatistics::TotalPagesInvisible,
    DailyStatistics::TotalNotes,
    DailyStatistics::TotalNotesPublic,
    DailyStatistics::TotalNotesOrganization,
    DailyStatistics::TotalNotesPrivate,
    DailyStatistics::TotalNotesInvisible,
    DailyStatistics::TotalUsersUploaded,
    DailyStatistics::TotalUsersPublicUploaded,
    DailyStatistics::TotalUsersPrivateUploaded,
    DailyStatistics::TotalUsersOrganizationUploaded,
    DailyStatistics::TotalOrganizationsUploaded,
    DailyStatistics::TotalOrganizationsPublicUploaded,
    DailyStatistics::TotalOrganizationsPrivateUploaded,
    DailyStatistics::TotalOrganizationsOrganizationUploaded,
    DailyStatistics::TotalProjects,
];

fn counter_values(snapshot: &StatisticsSnapshot) -> [u64; 30] {
    [
        snapshot.total_documents,
        snapshot.total_documents_public,
        snapshot.total_documents_organization,
        snapshot.total_documents_private,
        snapshot.total_documents_invisible,
        snapshot.total_documents_success,
        snapshot.total_documents_readable,
        snapshot.total_documents_pending,
        snapshot.total_documents_error,
        snapshot.total_documents_nofile,
        snapshot.total_documents_deleted,
        snapshot.total_pages,
        snapshot.total_pages_public,
        snapshot.total_pages_organization,
        snapshot.total_pages_private,
        snapshot.total_pages_invisible,
        snapshot.total_notes,
        snapshot.total_notes_public,
        snapshot.total_notes_organization,
        snapshot.total_notes_private,
        snapshot.total_notes_invisible,
        snapshot.total_users_uploaded,
        snapshot.total_users_public_uploaded,
        snapshot.total_users_private_uploaded,
        snapshot.total_users_organization_uploaded,
        snapshot.total_organizations_uploaded,
        snapshot.total_organizations_public_uploaded,
        snapshot.total_organizations_private_uploaded,
        snapshot.total_organizations_organization_uploaded,
        snapshot.total_projects,
    ]
}

#[derive(Debug, sqlx::FromRow)]
struct StatisticsLookup {
    id: i64,
    date: NaiveDate,
    total_documents: i64,
    total_documents_public: i64,
    total_documents_organization: i64,
    total_documents_private: i64,
    total_documents_invisible: i64,
    total_documents_success: i64,
    total_documents_readable: i64,
    total_documents_pending: i64,
    total_documents_error: i64,
    total_documents_nofile: i64,
    total_documents_deleted: i64,
    total_pages: i64,
    total_pages_public: i64,
    total_pages_organization: i64,
    total_pages_private: i64,
    total_pages_invisible: i64,
    total_notes: i64,
    total_notes_public: i64,
    total_notes_organization: i64,
    total_notes_private: i64,
    total_notes_invisible: i64,
    total_users_uploaded: i64,
    total_users_public_uploaded: i64,
    total_users_private_uploaded: i64,
    total_users_organization_uploaded: i64,
    total_organizations_uploaded: i64,
    total_organizations_public_uploaded: i64,
    total_organizations_private_uploaded: i64,
    total_organizations_organization_uploaded: i64,
    total_projects: i64,
}

impl TryFrom<StatisticsLookup> for Statistics {
    type Error = DatabaseError;

    fn try_from(value: StatisticsLookup) -> Result<Self, Self::Error> {
        let c = |v: i64| u64::try_from(v).map_err(DatabaseError::to_invalid_operation);

        Ok(Statistics {
            id: value.id,
            snapshot: StatisticsSnapshot {
                date: value.date,
                total_documents: c(value.total_documents)?,
                total_documents_public: c(value.total_documents_public)?,
                total_documents_organization: c(value.total_documents_organization)?,
                total_documents_private: c(value.total_documents_private)?,
                total_documents_invisible: c(value.total_documents_invisible)?,
                total_documents_success: c(value.total_documents_success)?,
                total_documents_readable: c(value.total_documents_readable)?,
                total_documents_pending: c(value.total_documents_pending)?,
                total_documents_error: c(value.total_documents_error)?,
                total_documents_nofile: c(value.total_documents_nofile)?,
                total_documents_deleted: c(value.total_documents_deleted)?,
                total_pages: c(value.total_pages)?,
                total_pages_public: c(value.total_pages_public)?,
                total_pages_organization: c(value.total_pages_organization)?,
                total_pages_private: c(value.total_pages_private)?,
                total_pages_invisible: c(value.total_pages_invisible)?,
                total_notes: c(value.total_notes)?,
                total_notes_public: c(value.total_notes_public)?,
                total_notes_organization: c(value.total_notes_organization)?,
                total_notes_private: c(value.total_notes_private)?,
                total_notes_invisible: c(value.total_notes_invisible)?,
                total_users_uploaded: c(value.total_users_uploaded)?,
                total_users_public_uploaded: c(value.total_users_public_uploaded)?,
                total_users_private_uploaded: c(value.total_users_private_uploaded)?,
                total_users_organization_uploaded: c(value.total_users_organization_uploaded)?,
                total_organizations_uploaded: c(value.total_organizations_uploaded)?,
                total_organizations_public_uploaded: c(value.total_organizations_public_uploaded)?,
                total_organizations_private_uploaded: c(
                    value.total_organizations_private_uploaded,
                )?,
                total_organizations_organization_uploaded: c(
                    value.total_organizations_organization_uploaded,
                )?,
                total_projects: c(value.total_projects)?,
            },
        })
    }
}

#[async_trait]
impl StatisticsRepository for PgStatisticsRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.statistics.add",
        skip_all,
        fields(
            db.query.text,
            statistics.date = %snapshot.date,
            statistics.id,
        ),
        err,
    )]
    async fn add(&mut self, snapshot: StatisticsSnapshot) -> Result<Statistics, Self::Error> {
        let mut values: Vec<SimpleExpr> = Vec::with_capacity(COUNTER_COLUMNS.len() + 1);
        values.push(snapshot.date.into());
        for value in counter_values(&snapshot) {
            let value = i64::try_from(value).map_err(DatabaseError::to_invalid_operation)?;
            values.push(value.into());
        }

        let (sql, arguments) = Query::insert()
            .into_table(DailyStatistics::Table)
            .columns(std::iter::once(DailyStatistics::Date).chain(COUNTER_COLUMNS))
            .values(values)
            .map_err(DatabaseError::to_invalid_operation)?
            .returning_col(DailyStatistics::Id)
            .build_sqlx(PostgresQueryBuilder);

        let id: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        tracing::Span::current().record("statistics.id", id);

        Ok(Statistics { id, snapshot })
    }

    #[tracing::instrument(
        name = "db.statistics.list_recent",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn list_recent(&mut self, limit: usize) -> Result<Vec<Statistics>, Self::Error> {
        let mut query = Query::select();
        query
            .column((DailyStatistics::Table, DailyStatistics::Id))
            .column((DailyStatistics::Table, DailyStatistics::Date));

        // The platform may have created the counters as INTEGER
        for column in COUNTER_COLUMNS {
            query.expr_as(
                Expr::col((DailyStatistics::Table, column)).cast_as(Alias::new("BIGINT")),
                column,
            );
        }

        let (sql, arguments) = query
            .from(DailyStatistics::Table)
            .order_by((DailyStatistics::Table, DailyStatistics::Id), Order::Desc)
            .limit(limit.try_into().unwrap_or(u64::MAX))
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<StatisticsLookup> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        rows.into_iter().map(Statistics::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use docstats_data_model::{Access, Status};
    use docstats_storage::{
        RepositoryAccess, RepositoryTransaction,
        document::DocumentFilter,
        note::NoteFilter,
    };
    use sqlx::PgPool;

    use super::*;
    use crate::PgRepository;

    async fn insert_document(
        pool: &PgPool,
        access: Access,
        status: Status,
        page_count: i32,
        user_id: i64,
        organization_id: i64,
    ) -> i64 {
        sqlx::query_scalar(
            r"
                INSERT INTO documents_document
                    (access, status, page_count, user_id, organization_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
            ",
        )
        .bind(access.as_i32())
        .bind(status.as_i32())
        .bind(page_count)
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_aggregates(pool: PgPool) {
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();

        // Empty tables
        let all = DocumentFilter::new();
        assert_eq!(repo.document().count(all).await.unwrap(), 0);
        assert_eq!(repo.document().sum_page_count(all).await.unwrap(), 0);
        assert_eq!(repo.document().count_distinct_users(all).await.unwrap(), 0);
        assert_eq!(repo.note().count(NoteFilter::new()).await.unwrap(), 0);
        assert_eq!(repo.project().count().await.unwrap(), 0);
        repo.cancel().await.unwrap();

        let first = insert_document(&pool, Access::Public, Status::Success, 10, 1, 100).await;
        insert_document(&pool, Access::Private, Status::Pending, 4, 1, 100).await;
        insert_document(&pool, Access::Organization, Status::Error, 1, 2, 200).await;

        sqlx::query("INSERT INTO documents_note (document_id, access) VALUES ($1, $2), ($1, $3)")
            .bind(first)
            .bind(Access::Public.as_i32())
            .bind(Access::Invisible.as_i32())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO projects_project (title) VALUES ('one'), ('two')")
            .execute(&pool)
            .await
            .unwrap();

        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        let public = DocumentFilter::new().with_access(Access::Public);
        assert_eq!(repo.document().count(all).await.unwrap(), 3);
        assert_eq!(repo.document().count(public).await.unwrap(), 1);
        assert_eq!(
            repo.document()
                .count(DocumentFilter::new().with_status(Status::Pending))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.document()
                .count(public.with_status(Status::Pending))
                .await
                .unwrap(),
            0
        );
        assert_eq!(repo.document().sum_page_count(all).await.unwrap(), 15);
        assert_eq!(repo.document().sum_page_count(public).await.unwrap(), 10);
        assert_eq!(
            repo.document()
                .sum_page_count(DocumentFilter::new().with_access(Access::Invisible))
                .await
                .unwrap(),
            0
        );
        assert_eq!(repo.document().count_distinct_users(all).await.unwrap(), 2);
        assert_eq!(
            repo.document()
                .count_distinct_organizations(all)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            repo.document()
                .count_distinct_users(DocumentFilter::new().with_access(Access::Private))
                .await
                .unwrap(),
            1
        );
        assert_eq!(repo.note().count(NoteFilter::new()).await.unwrap(), 2);
        assert_eq!(
            repo.note()
                .count(NoteFilter::new().with_access(Access::Invisible))
                .await
                .unwrap(),
            1
        );
        assert_eq!(repo.project().count().await.unwrap(), 2);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_add_and_list(pool: PgPool) {
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        assert!(repo.statistics().list_recent(10).await.unwrap().is_empty());

        let snapshot = StatisticsSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            total_documents: 3,
            total_documents_public: 1,
            total_pages: 15,
            total_organizations_organization_uploaded: 1,
            total_projects: 2,
            ..StatisticsSnapshot::default()
        };

        // Storing the same day twice gives two rows
        let first = repo.statistics().add(snapshot.clone()).await.unwrap();
        let second = repo.statistics().add(snapshot.clone()).await.unwrap();
        assert_ne!(first.id, second.id);
        repo.save().await.unwrap();

        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        let recent = repo.statistics().list_recent(10).await.unwrap();
        assert_eq!(recent, vec![second.clone(), first]);
        assert_eq!(recent[0].snapshot, snapshot);

        let recent = repo.statistics().list_recent(1).await.unwrap();
        assert_eq!(recent, vec![second]);
    }
}
