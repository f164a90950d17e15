// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the PostgreSQL implementation of the
//! [`SessionRepository`]

use async_trait::async_trait;
use docstats_storage::{Clock, session::SessionRepository};
use sqlx::PgConnection;

use crate::{DatabaseError, to_affected, to_limit, tracing::ExecuteExt};

/// An implementation of [`SessionRepository`] for a PostgreSQL connection
pub struct PgSessionRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgSessionRepository<'c> {
    /// Create a new [`PgSessionRepository`] from an active PostgreSQL
    /// connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.session.cleanup_expired",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn cleanup_expired(
        &mut self,
        clock: &dyn Clock,
        limit: usize,
    ) -> Result<usize, Self::Error> {
        let res = sqlx::query(
            r"
                DELETE FROM django_session
                WHERE session_key IN (
                    SELECT session_key
                    FROM django_session
                    WHERE expire_date < $1
                    LIMIT $2
                )
            ",
        )
        .bind(clock.now())
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
    use docstats_storage::{RepositoryAccess, RepositoryTransaction, clock::MockClock};
    use sqlx::PgPool;

    use super::*;
    use crate::PgRepository;

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_cleanup_expired(pool: PgPool) {
        let clock = MockClock::default();
        let now = clock.now();

        for (key, expire_date) in [
            ("expired-1", now - Duration::days(2)),
            ("expired-2", now - Duration::hours(1)),
            ("expired-3", now - Duration::seconds(1)),
            ("valid", now + Duration::days(14)),
        ] {
            sqlx::query("INSERT INTO django_session (session_key, expire_date) VALUES ($1, $2)")
                .bind(key)
                .bind(expire_date)
                .execute(&pool)
                .await
                .unwrap();
        }

        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        assert_eq!(repo.session().cleanup_expired(&clock, 2).await.unwrap(), 2);
        assert_eq!(repo.session().cleanup_expired(&clock, 2).await.unwrap(), 1);
        assert_eq!(repo.session().cleanup_expired(&clock, 2).await.unwrap(), 0);
        repo.save().await.unwrap();

        let remaining: Vec<String> = sqlx::query_scalar("SELECT session_key FROM django_session")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec!["valid".to_owned()]);

        // Once the valid session expires, it gets cleaned up as well
        clock.advance(Duration::days(15));
        let mut repo = PgRepository::from_pool(&pool).await.unwrap().boxed();
        assert_eq!(repo.session().cleanup_expired(&clock, 2).await.unwrap(), 1);
        repo.save().await.unwrap();
    }
}
