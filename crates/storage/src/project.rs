// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repositories to aggregate projects

use async_trait::async_trait;

use crate::repository_impl;

/// A [`ProjectRepository`] computes aggregates over the projects table
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Count all the projects
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn count(&mut self) -> Result<u64, Self::Error>;
}

repository_impl!(ProjectRepository:
    async fn count(&mut self) -> Result<u64, Self::Error>;
);
