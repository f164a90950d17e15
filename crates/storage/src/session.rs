// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repositories to purge the platform's web sessions

use async_trait::async_trait;

use crate::{Clock, repository_impl};

/// A [`SessionRepository`] purges expired web sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Delete a batch of sessions which expired before the current time
    ///
    /// Returns the number of sessions deleted. A result lower than `limit`
    /// means there are no expired sessions left.
    ///
    /// # Parameters
    ///
    /// * `clock`: The clock used to get the current time
    /// * `limit`: The maximum number of sessions to delete
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn cleanup_expired(
        &mut self,
        clock: &dyn Clock,
        limit: usize,
    ) -> Result<usize, Self::Error>;
}

repository_impl!(SessionRepository:
    async fn cleanup_expired(
        &mut self,
        clock: &dyn Clock,
        limit: usize,
    ) -> Result<usize, Self::Error>;
);
