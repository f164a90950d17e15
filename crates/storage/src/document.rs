// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repositories to aggregate the platform's documents

use async_trait::async_trait;
use docstats_data_model::{Access, Status};

use crate::repository_impl;

/// Filter parameters for aggregating documents
///
/// An empty filter matches every document. Setting both fields matches the
/// documents which have both the access tier and the status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFilter {
    access: Option<Access>,
    status: Option<Status>,
}

impl DocumentFilter {
    /// Create a new [`DocumentFilter`] with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match documents with the given access tier
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    /// Only match documents with the given status
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Get the access tier filter
    ///
    /// Returns [`None`] if no access filter was set
    #[must_use]
    pub fn access(&self) -> Option<Access> {
        self.access
    }

    /// Get the status filter
    ///
    /// Returns [`None`] if no status filter was set
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.status
    }
}

/// A [`DocumentRepository`] computes aggregates over the documents table
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Count the documents matching the given filter
    ///
    /// # Parameters
    ///
    /// * `filter`: The filter parameters
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error>;

    /// Sum the page count of the documents matching the given filter
    ///
    /// Returns 0 if no document matches.
    ///
    /// # Parameters
    ///
    /// * `filter`: The filter parameters
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn sum_page_count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error>;

    /// Count the distinct users who uploaded the documents matching the given
    /// filter
    ///
    /// # Parameters
    ///
    /// * `filter`: The filter parameters
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn count_distinct_users(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error>;

    /// Count the distinct organizations owning the documents matching the given
    /// filter
    ///
    /// # Parameters
    ///
    /// * `filter`: The filter parameters
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn count_distinct_organizations(
        &mut self,
        filter: DocumentFilter,
    ) -> Result<u64, Self::Error>;
}

repository_impl!(DocumentRepository:
    async fn count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error>;
    async fn sum_page_count(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error>;
    async fn count_distinct_users(&mut self, filter: DocumentFilter) -> Result<u64, Self::Error>;
    async fn count_distinct_organizations(
        &mut self,
        filter: DocumentFilter,
    ) -> Result<u64, Self::Error>;
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_builder() {
        let filter = DocumentFilter::new();
        assert_eq!(filter.access(), None);
        assert_eq!(filter.status(), None);

        let filter = filter
            .with_access(Access::Private)
            .with_status(Status::Pending);
        assert_eq!(filter.access(), Some(Access::Private));
        assert_eq!(filter.status(), Some(Status::Pending));
    }
}
