// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Interactions with the storage backend
//!
//! This crate provides a set of traits that can be implemented to interact with
//! the storage backend. Those traits are called repositories and are grouped by
//! the type of data they manage: the platform's documents, notes and projects
//! (read-only aggregates), the statistics snapshots, and the session and
//! revision stores that get purged by the cleanup job.
//!
//! Each of those repositories can be accessed via the [`RepositoryAccess`]
//! trait. This trait can be wrapped in a [`BoxRepository`] to allow using it
//! without caring about the underlying storage backend, and without carrying
//! around the generic type parameter.
//!
//! This crate also defines a [`Clock`] trait that can be used to abstract the
//! way the current time is retrieved. It has two implementation:
//! [`SystemClock`] that uses the system time and [`MockClock`] which is useful
//! for testing.
//!
//! With the `memory` feature, an in-memory backend is available in the
//! [`memory`] module. It computes the aggregates with plain iterator scans and
//! is meant for tests.
//!
//! [`MockClock`]: crate::clock::MockClock

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub(crate) mod repository;
mod utils;

pub mod document;
#[cfg(feature = "memory")]
pub mod memory;
pub mod note;
pub mod project;
pub mod revision;
pub mod session;
pub mod statistics;

pub use self::{
    clock::{Clock, SystemClock},
    repository::{
        BoxRepository, Repository, RepositoryAccess, RepositoryError,
        RepositoryFactory, RepositoryTransaction,
    },
    utils::MapErr,
};
