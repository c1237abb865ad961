//! Backends, callbacks and setup shared across test files.

use std::sync::atomic::{AtomicUsize, Ordering};

use helios_crud::backends::memory::{MemoryBackend, MemoryBackendConfig};
use helios_crud::core::{
    BackendCapability, BackendKind, Callback, Completion, Entity, StoreBackend,
};
use helios_crud::crud::{Crud, CrudConfig};
use helios_crud::error::{BackendError, StorageError, StorageResult};
use helios_crud::named::RawStatement;
use helios_crud::types::QueryModel;

use super::fixtures::Person;

/// Installs a test subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn create_crud() -> Crud<MemoryBackend> {
    init_tracing();
    Crud::new(MemoryBackend::new())
}

pub fn create_crud_with(
    backend_config: MemoryBackendConfig,
    config: CrudConfig,
) -> Crud<MemoryBackend> {
    init_tracing();
    Crud::with_config(MemoryBackend::with_config(backend_config), config)
}

/// A backend with every optional capability switched off.
pub fn create_minimal_crud() -> Crud<MemoryBackend> {
    create_crud_with(MemoryBackendConfig::minimal(), CrudConfig::default())
}

pub fn seed<B: StoreBackend>(crud: &Crud<B>) -> Vec<Person> {
    let mut saved = Vec::new();
    for person in super::fixtures::create_people() {
        saved.push(crud.save(person).unwrap());
    }
    saved
}

// ============================================================================
// Failure injection
// ============================================================================

/// Wraps a [`MemoryBackend`] and fails the Nth single-item write.
#[derive(Debug)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    fail_on: usize,
    writes: AtomicUsize,
}

impl FlakyBackend {
    /// Fails the `fail_on`-th (1-based) single-item save, update or delete.
    pub fn new(config: MemoryBackendConfig, fail_on: usize) -> Self {
        Self {
            inner: MemoryBackend::with_config(config),
            fail_on,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn attempt(&self, operation: &str) -> StorageResult<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(BackendError::failed("flaky", operation, "injected failure").into());
        }
        Ok(())
    }
}

impl StoreBackend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Custom("flaky")
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        self.inner.supports(capability)
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn perform_save<T: Entity>(&self, item: T) -> StorageResult<T> {
        self.attempt("save")?;
        self.inner.perform_save(item)
    }

    fn perform_update<T: Entity>(&self, item: T) -> StorageResult<T> {
        self.attempt("update")?;
        self.inner.perform_update(item)
    }

    fn perform_delete<T: Entity>(&self, item: &T) -> StorageResult<usize> {
        self.attempt("delete")?;
        self.inner.perform_delete(item)
    }

    fn perform_list<T: Entity>(&self, query: &QueryModel) -> StorageResult<Vec<T>> {
        self.inner.perform_list(query)
    }

    fn perform_count(&self, query: &QueryModel) -> StorageResult<usize> {
        self.inner.perform_count(query)
    }

    fn perform_delete_query<T: Entity>(&self, query: &QueryModel) -> StorageResult<usize> {
        self.inner.perform_delete_query::<T>(query)
    }

    fn perform_save_batch<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        self.inner.perform_save_batch(items)
    }

    fn perform_update_batch<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        self.inner.perform_update_batch(items)
    }

    fn perform_delete_batch<T: Entity>(&self, items: &[T]) -> StorageResult<usize> {
        self.inner.perform_delete_batch(items)
    }

    fn perform_statement(&self, statement: &RawStatement) -> StorageResult<usize> {
        self.inner.perform_statement(statement)
    }
}

// ============================================================================
// Recording callback
// ============================================================================

/// One notification seen by a [`Recorder`].
#[derive(Debug)]
pub enum Event<R> {
    Success {
        value: R,
        message: String,
        /// `(count, size)` of the active batch, if any.
        progress: Option<(usize, usize)>,
    },
    Failure {
        error: StorageError,
        message: String,
    },
}

/// Records every notification in order.
#[derive(Debug)]
pub struct Recorder<R> {
    pub events: Vec<Event<R>>,
}

impl<R> Recorder<R> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn successes(&self) -> Vec<&R> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Success { value, .. } => Some(value),
                Event::Failure { .. } => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<&StorageError> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Failure { error, .. } => Some(error),
                Event::Success { .. } => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<Option<(usize, usize)>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Success { progress, .. } => Some(*progress),
                Event::Failure { .. } => None,
            })
            .collect()
    }
}

impl<R> Callback<R> for Recorder<R> {
    fn on_success(&mut self, value: R, completion: &Completion<'_>) {
        self.events.push(Event::Success {
            value,
            message: completion.message().to_string(),
            progress: completion.batch().map(|b| (b.count(), b.size())),
        });
    }

    fn on_failure(&mut self, error: StorageError, completion: &Completion<'_>) {
        self.events.push(Event::Failure {
            error,
            message: completion.message().to_string(),
        });
    }
}
