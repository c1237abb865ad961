//! Store backend abstraction.
//!
//! This module defines the [`StoreBackend`] trait, the contract a concrete
//! store adapter implements so that [`Crud`](crate::crud::Crud) can drive it.
//! Single-item operations and listing are mandatory; everything a store may
//! or may not offer natively is advertised through [`BackendCapability`] and
//! has a default implementation that reports the capability as unsupported.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::core::Entity;
use crate::error::{BackendError, StorageResult};
use crate::named::RawStatement;
use crate::types::QueryModel;

/// Identifies the family of store behind a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Process-local, non-durable store.
    Memory,
    /// Relational database.
    Relational,
    /// Document store.
    Document,
    /// Key-value store.
    KeyValue,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Relational => write!(f, "relational"),
            BackendKind::Document => write!(f, "document"),
            BackendKind::KeyValue => write!(f, "key-value"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Optional features a backend may offer natively.
///
/// The orchestrator checks these at dispatch time and falls back to a
/// framework-side emulation when a capability is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendCapability {
    /// Saves a whole collection in one call.
    NativeSaveBatch,
    /// Updates a whole collection in one call.
    NativeUpdateBatch,
    /// Deletes a whole collection in one call.
    NativeDeleteBatch,
    /// Applies `page`/`page_size` of a [`QueryModel`] itself.
    PaginatedQuery,
    /// Counts matches without materializing them.
    NativeCount,
    /// Deletes every match of a query in one call.
    QueryDelete,
    /// Executes store-native raw statements.
    RawStatements,
}

impl BackendCapability {
    /// All capabilities, in declaration order.
    pub const ALL: [BackendCapability; 7] = [
        BackendCapability::NativeSaveBatch,
        BackendCapability::NativeUpdateBatch,
        BackendCapability::NativeDeleteBatch,
        BackendCapability::PaginatedQuery,
        BackendCapability::NativeCount,
        BackendCapability::QueryDelete,
        BackendCapability::RawStatements,
    ];
}

impl fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendCapability::NativeSaveBatch => "native-save-batch",
            BackendCapability::NativeUpdateBatch => "native-update-batch",
            BackendCapability::NativeDeleteBatch => "native-delete-batch",
            BackendCapability::PaginatedQuery => "paginated-query",
            BackendCapability::NativeCount => "native-count",
            BackendCapability::QueryDelete => "query-delete",
            BackendCapability::RawStatements => "raw-statements",
        };
        write!(f, "{}", name)
    }
}

/// A store adapter that can execute CRUD operations.
///
/// Implementations are expected to be cheap to share (`Send + Sync`) and to
/// report failures as [`StorageError`](crate::error::StorageError) values
/// rather than panicking. Any I/O-level failure should be wrapped with
/// [`BackendError::failed`] so that it names the store and operation.
///
/// # Required operations
///
/// `perform_save`, `perform_update`, `perform_delete` and `perform_list` must
/// always work. The remaining operations default to
/// [`BackendError::UnsupportedCapability`]; a backend that overrides one of
/// them must also return `true` from [`supports`](Self::supports) for the
/// matching capability, otherwise the orchestrator never calls it.
///
/// # Example
///
/// ```ignore
/// use helios_crud::core::{BackendCapability, StoreBackend};
///
/// if backend.supports(BackendCapability::NativeCount) {
///     backend.perform_count(&query)?;
/// } else {
///     backend.perform_list::<Person>(&query)?.len();
/// }
/// ```
pub trait StoreBackend: Send + Sync + Debug {
    /// Human-readable name, used in error messages and logs.
    fn name(&self) -> &'static str;

    /// The family of store.
    fn kind(&self) -> BackendKind;

    /// Checks if this backend offers the given capability.
    fn supports(&self, capability: BackendCapability) -> bool;

    /// Returns all capabilities offered by this backend.
    fn capabilities(&self) -> Vec<BackendCapability> {
        BackendCapability::ALL
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }

    /// Whether the underlying connection is usable.
    fn is_connected(&self) -> bool {
        true
    }

    /// Persists a new entity and returns it as stored.
    fn perform_save<T: Entity>(&self, item: T) -> StorageResult<T>;

    /// Overwrites a stored entity and returns it as stored.
    fn perform_update<T: Entity>(&self, item: T) -> StorageResult<T>;

    /// Deletes one entity, returning the number of rows removed.
    fn perform_delete<T: Entity>(&self, item: &T) -> StorageResult<usize>;

    /// Returns every entity of type `T` matching the query.
    fn perform_list<T: Entity>(&self, query: &QueryModel) -> StorageResult<Vec<T>>;

    /// Counts entities matching the query.
    fn perform_count(&self, query: &QueryModel) -> StorageResult<usize> {
        let _ = query;
        Err(BackendError::unsupported(self.name(), BackendCapability::NativeCount).into())
    }

    /// Deletes every entity of type `T` matching the query.
    fn perform_delete_query<T: Entity>(&self, query: &QueryModel) -> StorageResult<usize> {
        let _ = query;
        Err(BackendError::unsupported(self.name(), BackendCapability::QueryDelete).into())
    }

    /// Persists a collection in one call.
    fn perform_save_batch<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        let _ = items;
        Err(BackendError::unsupported(self.name(), BackendCapability::NativeSaveBatch).into())
    }

    /// Overwrites a collection in one call.
    fn perform_update_batch<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        let _ = items;
        Err(BackendError::unsupported(self.name(), BackendCapability::NativeUpdateBatch).into())
    }

    /// Deletes a collection in one call.
    fn perform_delete_batch<T: Entity>(&self, items: &[T]) -> StorageResult<usize> {
        let _ = items;
        Err(BackendError::unsupported(self.name(), BackendCapability::NativeDeleteBatch).into())
    }

    /// Executes a raw statement, returning the number of affected rows.
    fn perform_statement(&self, statement: &RawStatement) -> StorageResult<usize> {
        let _ = statement;
        Err(BackendError::unsupported(self.name(), BackendCapability::RawStatements).into())
    }
}
