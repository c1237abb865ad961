//! Async adapter over the blocking orchestrator.

use std::sync::Arc;

use crate::core::{Entity, StoreBackend};
use crate::crud::{Crud, Subject};
use crate::error::{BackendError, StorageResult};
use crate::named::Variables;

/// Runs [`Crud`] operations on tokio's blocking thread pool.
///
/// Each call moves one whole operation onto
/// [`tokio::task::spawn_blocking`]; the operation itself stays sequential.
/// Cloning is cheap and shares the same orchestrator.
///
/// ```ignore
/// let crud = AsyncCrud::new(Crud::new(MemoryBackend::new()));
/// let saved = crud.save(person).await?;
/// let everyone = crud.list(Subject::query(QueryModel::for_entity::<Person>())).await?;
/// ```
#[derive(Debug)]
pub struct AsyncCrud<B: StoreBackend> {
    inner: Arc<Crud<B>>,
}

impl<B: StoreBackend> Clone for AsyncCrud<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: StoreBackend + 'static> AsyncCrud<B> {
    /// Wraps an orchestrator.
    pub fn new(crud: Crud<B>) -> Self {
        Self::from_arc(Arc::new(crud))
    }

    /// Wraps a shared orchestrator.
    pub fn from_arc(inner: Arc<Crud<B>>) -> Self {
        Self { inner }
    }

    /// The wrapped orchestrator.
    pub fn inner(&self) -> &Arc<Crud<B>> {
        &self.inner
    }

    async fn run<R, F>(&self, operation: &'static str, f: F) -> StorageResult<R>
    where
        F: FnOnce(&Crud<B>) -> StorageResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let crud = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&crud))
            .await
            .map_err(|e| BackendError::TaskFailed {
                message: format!("{}: {}", operation, e),
            })?
    }

    /// See [`Crud::save`].
    pub async fn save<T: Entity>(&self, item: T) -> StorageResult<T> {
        self.run("save", move |crud| crud.save(item)).await
    }

    /// See [`Crud::save_all`].
    pub async fn save_all<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        self.run("save", move |crud| crud.save_all(items)).await
    }

    /// See [`Crud::update`].
    pub async fn update<T: Entity>(&self, item: T) -> StorageResult<T> {
        self.run("update", move |crud| crud.update(item)).await
    }

    /// See [`Crud::update_all`].
    pub async fn update_all<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        self.run("update", move |crud| crud.update_all(items)).await
    }

    /// See [`Crud::delete`].
    pub async fn delete<T: Entity>(&self, subject: Subject<T>) -> StorageResult<usize> {
        self.run("delete", move |crud| crud.delete(subject)).await
    }

    /// See [`Crud::find`].
    pub async fn find<T: Entity>(&self, template: T) -> StorageResult<Option<T>> {
        self.run("find", move |crud| crud.find(&template)).await
    }

    /// See [`Crud::list`].
    pub async fn list<T: Entity>(&self, subject: Subject<T>) -> StorageResult<Vec<T>> {
        self.run("list", move |crud| crud.list(subject)).await
    }

    /// See [`Crud::count`].
    pub async fn count<T: Entity>(&self, subject: Subject<T>) -> StorageResult<usize> {
        self.run("count", move |crud| crud.count(subject)).await
    }

    /// See [`Crud::list_named`].
    pub async fn list_named<T: Entity>(
        &self,
        provider: impl Into<String>,
        name: impl Into<String>,
        vars: Variables,
    ) -> StorageResult<Vec<T>> {
        let (provider, name) = (provider.into(), name.into());
        self.run("list", move |crud| crud.list_named(&provider, &name, &vars))
            .await
    }

    /// See [`Crud::execute_named`].
    pub async fn execute_named(
        &self,
        provider: impl Into<String>,
        name: impl Into<String>,
        vars: Variables,
    ) -> StorageResult<usize> {
        let (provider, name) = (provider.into(), name.into());
        self.run("execute", move |crud| {
            crud.execute_named(&provider, &name, &vars)
        })
        .await
    }
}
