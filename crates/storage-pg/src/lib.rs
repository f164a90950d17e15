// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! An implementation of the storage traits for a PostgreSQL database
//!
//! This backend uses [`sqlx`] to interact with the database. Most queries are
//! built with [`sea_query`], and the few cleanup statements which need a CTE
//! are written by hand.
//!
//! The document, note, project, session and revision tables are owned by the
//! platform and are only read or purged from here. The bundled migrations
//! create them if they don't exist, so that a blank database can be used for
//! development and testing.
//!
//! # Defining a new query
//!
//! 1. Describe the table and columns in the [`iden`] module
//! 2. Build the query with [`sea_query`] and bind it with
//!    [`sea_query_binder::SqlxBinder::build_sqlx`]
//! 3. Call `.traced()` on the query before executing it, so that the SQL text
//!    is recorded in the current span under `db.query.text`
//! 4. Wrap the method in a `#[tracing::instrument]` span named
//!    `db.<repository>.<method>`

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use std::sync::LazyLock;

use opentelemetry::{
    InstrumentationScope,
    metrics::{Histogram, Meter},
};
use opentelemetry_semantic_conventions as semcov;
use sqlx::migrate::Migrator;
use thiserror::Error;

pub mod document;
pub mod note;
pub mod project;
pub mod revision;
pub mod session;
pub mod statistics;

mod filter;
pub(crate) mod iden;
pub(crate) mod repository;
pub(crate) mod tracing;

pub use self::{
    document::PgDocumentRepository,
    note::PgNoteRepository,
    project::PgProjectRepository,
    repository::{PgRepository, PgRepositoryFactory},
    revision::PgRevisionRepository,
    session::PgSessionRepository,
    statistics::PgStatisticsRepository,
};

/// Embedded migrations, allowing them to run on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();

static METER: LazyLock<Meter> = LazyLock::new(|| {
    let scope = InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semcov::SCHEMA_URL)
        .build();

    opentelemetry::global::meter_with_scope(scope)
});

pub(crate) static DB_CLIENT_CONNECTIONS_CREATE_TIME_HISTOGRAM: LazyLock<Histogram<u64>> =
    LazyLock::new(|| {
        METER
            .u64_histogram("db.client.connections.create_time")
            .with_description("The time it took to create a new connection.")
            .with_unit("ms")
            .build()
    });

/// Generic error when interacting with the database
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An error which came from the database itself
    #[error(transparent)]
    Driver {
        /// The underlying error from the database driver
        #[from]
        source: sqlx::Error,
    },

    /// An error which occured while converting the data from the database
    #[error("Invalid database operation")]
    InvalidOperation {
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl DatabaseError {
    pub(crate) fn to_invalid_operation<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::InvalidOperation {
            source: Some(Box::new(e)),
        }
    }
}

/// Convert a count returned by the database into a [`u64`]
fn to_count(value: i64) -> Result<u64, DatabaseError> {
    value
        .try_into()
        .map_err(DatabaseError::to_invalid_operation)
}

/// Convert a limit into the [`i64`] used by the `LIMIT` clause
fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Convert a number of affected rows into a [`usize`]
fn to_affected(rows: u64) -> usize {
    rows.try_into().unwrap_or(usize::MAX)
}
