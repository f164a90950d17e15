// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repositories to purge the revision history

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::repository_impl;

/// A [`RevisionRepository`] purges old entries of the revision history
#[async_trait]
pub trait RevisionRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Delete a batch of revisions created before the given time, along with
    /// their versions
    ///
    /// Returns the number of revisions deleted. A result lower than `limit`
    /// means there are no matching revisions left.
    ///
    /// # Parameters
    ///
    /// * `until`: Revisions created strictly before this time are deleted
    /// * `limit`: The maximum number of revisions to delete
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn cleanup_older_than(
        &mut self,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, Self::Error>;
}

repository_impl!(RevisionRepository:
    async fn cleanup_older_than(
        &mut self,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, Self::Error>;
);
