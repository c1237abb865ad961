//! Error types for CRUD orchestration.
//!
//! This module defines the error hierarchy used throughout the crate. A single
//! [`StorageError`] wraps category enums so that callers can match broadly
//! (`StorageError::Validation(_)`) or precisely
//! (`ValidationError::InvalidOperator { .. }`).
//!
//! All errors are `Clone`: an [`Invoker`](crate::core::Invoker) may deliver
//! the same failure to both its target and its source callback.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::core::BackendCapability;
use crate::types::Operator;

/// The primary error type for all CRUD operations.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Caller-side mistakes detected before or while talking to the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store connection is not usable.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Entity state errors.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Opaque failures reported by the store backend.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors caused by invalid input to an operation.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    /// An operator that needs a value was used while filtering by bare type.
    #[error("operator {operator} is not allowed on '{path}' when filtering by type {entity_type}")]
    InvalidOperator {
        entity_type: String,
        path: String,
        operator: Operator,
    },

    /// A named-query provider returned the wrong kind of statement.
    #[error("named query {provider}/{name} is a {actual} statement, expected {expected}")]
    WrongStatementType {
        provider: String,
        name: String,
        expected: StatementKind,
        actual: StatementKind,
    },

    /// The verb does not accept this argument shape.
    #[error("{operation} does not accept {shape}")]
    UnsupportedArgument { operation: String, shape: String },

    /// An AND/OR node was built with fewer than two children.
    #[error("{kind} expression requires at least 2 children, got {count}")]
    DegenerateExpression { kind: &'static str, count: usize },

    /// A placeholder has no bound variable.
    #[error("unbound placeholder ${{{name}}}")]
    UnboundPlaceholder { name: String },

    /// No provider is registered under this name.
    #[error("unknown query provider: {provider}")]
    UnknownProvider { provider: String },

    /// The provider has no query with this name.
    #[error("named query not found: {provider}/{name}")]
    UnknownQuery { provider: String, name: String },

    /// A value could not be assigned to an entity field.
    #[error("invalid value for {entity_type}.{field}: {message}")]
    InvalidFieldValue {
        entity_type: String,
        field: String,
        message: String,
    },

    /// The entity type has no field with this name.
    #[error("unknown field {entity_type}.{field}")]
    UnknownField { entity_type: String, field: String },

    /// The entity type declares no key field.
    #[error("entity type {entity_type} has no key field")]
    MissingKey { entity_type: String },

    /// Page and page size must both be -1 or both be usable.
    #[error("invalid pagination: page {page}, page size {page_size}")]
    InvalidPagination { page: i64, page_size: i64 },
}

/// The two shapes a named statement can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// A structured [`QueryModel`](crate::types::QueryModel).
    Query,
    /// A store-native raw statement.
    Raw,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Query => write!(f, "query"),
            StatementKind::Raw => write!(f, "raw"),
        }
    }
}

/// Errors related to the store connection.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// An operation was attempted while disconnected.
    #[error("connection to {backend_name} is closed; cannot {operation}")]
    Closed {
        backend_name: String,
        operation: String,
    },
}

/// Errors related to entity state.
#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    /// `find` matched more than one entity.
    #[error("find on {entity_type} matched {count} entities, expected at most 1")]
    Ambiguous { entity_type: String, count: usize },

    /// No stored entity has this key.
    #[error("entity not found: {entity_type}/{key}")]
    NotFound { entity_type: String, key: String },

    /// An entity with this key is already stored.
    #[error("entity already exists: {entity_type}/{key}")]
    AlreadyExists { entity_type: String, key: String },
}

/// Errors originating from the store backend.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The backend does not offer this capability.
    #[error("capability '{capability}' not supported by {backend_name}")]
    UnsupportedCapability {
        backend_name: String,
        capability: BackendCapability,
    },

    /// A backend operation failed.
    #[error("{operation} failed in {backend_name}: {message}")]
    OperationFailed {
        backend_name: String,
        operation: String,
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },

    /// A blocking task could not be joined.
    #[error("background task failed: {message}")]
    TaskFailed { message: String },

    /// A callback-form operation finished without reporting an outcome.
    #[error("{operation} completed without an outcome")]
    NoOutcome { operation: String },
}

impl BackendError {
    /// Wraps an arbitrary failure, naming the store and the operation.
    pub fn failed(
        backend_name: impl Into<String>,
        operation: impl Into<String>,
        err: impl fmt::Display,
    ) -> Self {
        BackendError::OperationFailed {
            backend_name: backend_name.into(),
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Shorthand for [`BackendError::UnsupportedCapability`].
    pub fn unsupported(backend_name: impl Into<String>, capability: BackendCapability) -> Self {
        BackendError::UnsupportedCapability {
            backend_name: backend_name.into(),
            capability,
        }
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}
