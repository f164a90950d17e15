// Copyright 2026 Element Creations Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::{
    document::DocumentRepository,
    note::NoteRepository,
    project::ProjectRepository,
    revision::RevisionRepository,
    session::SessionRepository,
    statistics::StatisticsRepository,
};

/// A [`RepositoryFactory`] is a factory that can create a [`BoxRepository`]
#[async_trait]
pub trait RepositoryFactory {
    /// Create a new [`BoxRepository`]
    async fn create(&self) -> Result<BoxRepository, RepositoryError>;
}

/// A [`Repository`] helps interacting with the underlying storage backend.
pub trait Repository<E>:
    RepositoryAccess<Error = E> + RepositoryTransaction<Error = E> + Send
where
    E: std::error::Error + Send + Sync + 'static,
{
}

/// An opaque, type-erased error
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RepositoryError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl RepositoryError {
    /// Construct a [`RepositoryError`] from any error kind
    pub fn from_error<E>(value: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(value),
        }
    }
}

/// A type-erased [`Repository`]
pub type BoxRepository = Box<dyn Repository<RepositoryError> + Send + Sync + 'static>;

/// A [`RepositoryTransaction`] can be saved or cancelled, after a series
/// of operations.
pub trait RepositoryTransaction {
    /// The error type used by the [`Self::save`] and [`Self::cancel`] functions
    type Error;

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage backend failed to commit the
    /// transaction.
    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;

    /// Rollback the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage backend failed to rollback
    /// the transaction.
    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;
}

/// Access the various repositories the backend implements.
///
/// All the methods return a boxed trait object, which can be used to access a
/// particular repository. The lifetime of the returned object is bound to the
/// lifetime of the whole repository, so that only one mutable reference to the
/// repository is used at a time.
///
/// When adding a new repository, you should add a new method to this trait, and
/// update the implementations for [`MapErr`](crate::MapErr) and [`Box<R>`] below.
///
/// Note: this used to have generic associated types to avoid boxing all the
/// repository traits, but that was removed because it made almost impossible
/// to box the trait object. This might be a shortcoming of the initial
/// implementation of generic associated types, and might be fixed in the
/// future.
pub trait RepositoryAccess: Send {
    /// The backend-specific error type used by each repository.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get a [`DocumentRepository`]
    fn document<'c>(&'c mut self) -> Box<dyn DocumentRepository<Error = Self::Error> + 'c>;

    /// Get a [`NoteRepository`]
    fn note<'c>(&'c mut self) -> Box<dyn NoteRepository<Error = Self::Error> + 'c>;

    /// Get a [`ProjectRepository`]
    fn project<'c>(&'c mut self) -> Box<dyn ProjectRepository<Error = Self::Error> + 'c>;

    /// Get a [`StatisticsRepository`]
    fn statistics<'c>(&'c mut self) -> Box<dyn StatisticsRepository<Error = Self::Error> + 'c>;

    /// Get a [`SessionRepository`]
    fn session<'c>(&'c mut self) -> Box<dyn SessionRepository<Error = Self::Error> + 'c>;

    /// Get a [`RevisionRepository`]
    fn revision<'c>(&'c mut self) -> Box<dyn RevisionRepository<Error = Self::Error> + 'c>;
}

/// Implementations of the [`RepositoryAccess`], [`RepositoryTransaction`] and
/// [`Repository`] for the [`MapErr`] wrapper and [`Box<R>`]
mod impls {
    use futures_util::{FutureExt, TryFutureExt, future::BoxFuture};

    use super::RepositoryAccess;
    use crate::{
        MapErr, Repository, RepositoryTransaction, document::DocumentRepository,
        note::NoteRepository, project::ProjectRepository, revision::RevisionRepository,
        session::SessionRepository, statistics::StatisticsRepository,
    };

    // --- Repository ---
    impl<R, F, E1, E2> Repository<E2> for MapErr<R, F>
    where
        R: Repository<E1> + RepositoryAccess<Error = E1> + RepositoryTransaction<Error = E1>,
        F: FnMut(E1) -> E2 + Send + Sync + 'static,
        E1: std::error::Error + Send + Sync + 'static,
        E2: std::error::Error + Send + Sync + 'static,
    {
    }

    // --- RepositoryTransaction --
    impl<R, F, E> RepositoryTransaction for MapErr<R, F>
    where
        R: RepositoryTransaction,
        R::Error: 'static,
        F: FnMut(R::Error) -> E + Send + Sync + 'static,
        E: std::error::Error,
    {
        type Error = E;

        fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
            Box::new(self.inner).save().map_err(self.mapper).boxed()
        }

        fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
            Box::new(self.inner).cancel().map_err(self.mapper).boxed()
        }
    }

    // --- RepositoryAccess --
    impl<R, F, E> RepositoryAccess for MapErr<R, F>
    where
        R: RepositoryAccess,
        R::Error: 'static,
        F: FnMut(R::Error) -> E + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        type Error = E;

        fn document<'c>(&'c mut self) -> Box<dyn DocumentRepository<Error = Self::Error> + 'c> {
            Box::new(MapErr::new(self.inner.document(), &mut self.mapper))
        }

        fn note<'c>(&'c mut self) -> Box<dyn NoteRepository<Error = Self::Error> + 'c> {
            Box::new(MapErr::new(self.inner.note(), &mut self.mapper))
        }

        fn project<'c>(&'c mut self) -> Box<dyn ProjectRepository<Error = Self::Error> + 'c> {
            Box::new(MapErr::new(self.inner.project(), &mut self.mapper))
        }

        fn statistics<'c>(
            &'c mut self,
        ) -> Box<dyn StatisticsRepository<Error = Self::Error> + 'c> {
            Box::new(MapErr::new(self.inner.statistics(), &mut self.mapper))
        }

        fn session<'c>(&'c mut self) -> Box<dyn SessionRepository<Error = Self::Error> + 'c> {
            Box::new(MapErr::new(self.inner.session(), &mut self.mapper))
        }

        fn revision<'c>(&'c mut self) -> Box<dyn RevisionRepository<Error = Self::Error> + 'c> {
            Box::new(MapErr::new(self.inner.revision(), &mut self.mapper))
        }
    }

    impl<R: RepositoryAccess + ?Sized> RepositoryAccess for Box<R> {
        type Error = R::Error;

        fn document<'c>(&'c mut self) -> Box<dyn DocumentRepository<Error = Self::Error> + 'c> {
            (**self).document()
        }

        fn note<'c>(&'c mut self) -> Box<dyn NoteRepository<Error = Self::Error> + 'c> {
            (**self).note()
        }

        fn project<'c>(&'c mut self) -> Box<dyn ProjectRepository<Error = Self::Error> + 'c> {
            (**self).project()
        }

        fn statistics<'c>(
            &'c mut self,
        ) -> Box<dyn StatisticsRepository<Error = Self::Error> + 'c> {
            (**self).statistics()
        }

        fn session<'c>(&'c mut self) -> Box<dyn SessionRepository<Error = Self::Error> + 'c> {
            (**self).session()
        }

        fn revision<'c>(&'c mut self) -> Box<dyn RevisionRepository<Error = Self::Error> + 'c> {
            (**self).revision()
        }
    }
}
