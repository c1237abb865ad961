//! In-memory reference backend.
//!
//! [`MemoryBackend`] implements every [`StoreBackend`](crate::core::StoreBackend)
//! operation and lets callers choose which optional capabilities it
//! advertises, which makes it useful for exercising both the native and the
//! emulated paths of [`Crud`](crate::crud::Crud).
//!
//! ```
//! use helios_crud::backends::memory::{MemoryBackend, MemoryBackendConfig};
//! use helios_crud::core::{BackendCapability, StoreBackend};
//!
//! let backend = MemoryBackend::with_config(
//!     MemoryBackendConfig::new().without(BackendCapability::NativeCount),
//! );
//! assert!(!backend.supports(BackendCapability::NativeCount));
//! assert!(backend.supports(BackendCapability::QueryDelete));
//! ```

mod eval;
mod storage;

pub use storage::{KeyStrategy, MemoryBackend, MemoryBackendConfig, OperationStats};
