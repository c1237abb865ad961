//! Store backend implementations.
//!
//! # Available Backends
//!
//! | Backend | Feature | Notes |
//! |---------|---------|-------|
//! | Memory  | `memory` | Process-local reference implementation |
//!
//! Concrete adapters for relational, document or key-value stores implement
//! [`StoreBackend`](crate::core::StoreBackend) outside this crate.

#[cfg(feature = "memory")]
pub mod memory;
