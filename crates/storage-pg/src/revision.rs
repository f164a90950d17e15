// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the PostgreSQL implementation of the
//! [`RevisionRepository`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docstats_storage::revision::RevisionRepository;
use sqlx::PgConnection;

use crate::{DatabaseError, to_affected, to_limit, tracing::ExecuteExt};

/// An implementation of [`RevisionRepository`] for a PostgreSQL connection
pub struct PgRevisionRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgRevisionRepository<'c> {
    /// Create a new [`PgRevisionRepository`] from an active PostgreSQL
    /// connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RevisionRepository for PgRevisionRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.revision.cleanup_older_than",
        skip_all,
        fields(
            db.query.text,
            revision.until = %until,
        ),
        err,
    )]
    async fn cleanup_older_than(
        &mut self,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, Self::Error> {
        // Versions go in the same statement, so that the foreign key holds at
        // the end of it
        let res = sqlx::query(
            r"
                WITH to_delete AS (
                    SELECT id
                    FROM reversion_revision
                    WHERE date_created < $1
                    ORDER BY id
                    LIMIT $2
                ), deleted_versions AS (
                    DELETE FROM reversion_version
                    USING to_delete
                    WHERE reversion_version.revision_id = to_delete.id
                )
                DELETE FROM reversion_revision
                USING to_delete
                WHERE reversion_revision.id = to_delete.id
            ",
        )
        .bind(until)
        .bind(to_limit(limit))
        .traced()
        .execute(&mut *self.conn)
        .await?;

        Ok(to_affected(res.rows_affected()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use docstats_storage::{Clock, RepositoryAccess, RepositoryTransaction, clock::MockClock};
    use sqlx::PgPool;

    use super::*;
    use crate::PgRepository;

    async fn insert_revision(pool: &PgPool, date_created: DateTime<Utc>, versions: usize) -> i64 {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO reversion_revision (date_created) VALUES ($1) RETURNING id",
        )
        .bind(date_created)
        .fetch_one(pool)
        .await
        .unwrap();

        for _ in 0..versions {
            sqlx::query("INSERT INTO reversion_version (revision_id) VALUES ($1)")
                .bind(id)
                .execute(pool)
                .await
                .unwrap();
        }

        id
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_cleanup_older_than(pool: PgPool) {
        let clock = MockClock::default();
        let now = clock.now();
        let until = now - Duration::days(180);

        insert_revision(&pool, now - Duration::days(400), 2).await;
        insert_revision(&pool, now - Duration::days(181), 0).await;
        insert_revision(&pool, now - Duration::days(200), 3).await;
        let recent = insert_revision(&pool, now - Duration::days(179), 4).await;

        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        assert_eq!(
            repo.revision().cleanup_older_than(until, 2).await.unwrap(),
            2
        );
        assert_eq!(
            repo.revision().cleanup_older_than(until, 2).await.unwrap(),
            1
        );
        assert_eq!(
            repo.revision().cleanup_older_than(until, 2).await.unwrap(),
            0
        );
        repo.save().await.unwrap();

        let remaining: Vec<i64> = sqlx::query_scalar("SELECT id FROM reversion_revision")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec![recent]);

        let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reversion_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(versions, 4);
    }
}
