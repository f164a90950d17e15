// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repositories to store the daily statistics snapshots

use async_trait::async_trait;
use docstats_data_model::{Statistics, StatisticsSnapshot};

use crate::repository_impl;

/// A [`StatisticsRepository`] stores [`Statistics`] rows. Rows are only ever
/// appended.
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Store a new snapshot
    ///
    /// Returns the stored [`Statistics`], with its newly assigned ID. Storing
    /// two snapshots for the same date creates two rows.
    ///
    /// # Parameters
    ///
    /// * `snapshot`: The counters to store
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn add(&mut self, snapshot: StatisticsSnapshot) -> Result<Statistics, Self::Error>;

    /// List the most recently stored snapshots, newest first
    ///
    /// # Parameters
    ///
    /// * `limit`: The maximum number of rows to return
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn list_recent(&mut self, limit: usize) -> Result<Vec<Statistics>, Self::Error>;
}

repository_impl!(StatisticsRepository:
    async fn add(&mut self, snapshot: StatisticsSnapshot) -> Result<Statistics, Self::Error>;
    async fn list_recent(&mut self, limit: usize) -> Result<Vec<Statistics>, Self::Error>;
);
