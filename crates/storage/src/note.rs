// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repositories to aggregate the notes attached to documents

use async_trait::async_trait;
use docstats_data_model::Access;

use crate::repository_impl;

/// Filter parameters for aggregating notes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoteFilter {
    access: Option<Access>,
}

impl NoteFilter {
    /// Create a new [`NoteFilter`] with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match notes with the given access tier
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    /// Get the access tier filter
    ///
    /// Returns [`None`] if no access filter was set
    #[must_use]
    pub fn access(&self) -> Option<Access> {
        self.access
    }
}

/// A [`NoteRepository`] computes aggregates over the notes table
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Count the notes matching the given filter
    ///
    /// # Parameters
    ///
    /// * `filter`: The filter parameters
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn count(&mut self, filter: NoteFilter) -> Result<u64, Self::Error>;
}

repository_impl!(NoteRepository:
    async fn count(&mut self, filter: NoteFilter) -> Result<u64, Self::Error>;
);
