//! Core traits and execution primitives.
//!
//! - [`StoreBackend`] - Store adapter contract and [`BackendCapability`] flags
//! - [`Entity`], [`Reflect`], [`EntityType`] - Entity metadata capability
//! - [`Callback`] - Outcome delivery, with the [`Capture`], [`Gather`],
//!   [`Counting`] and [`Hooks`] adapters
//! - [`Invoker`] - Single-use completion handle
//! - [`BatchController`] - Progress of a simulated batch
//!
//! # How the pieces fit
//!
//! ```text
//! Crud::save_with(Subject::many(items), callback)
//!     ├── native batch   → StoreBackend::perform_save_batch → Invoker → callback
//!     └── simulated      → BatchController::init_batch(len)
//!                          for each item:
//!                              StoreBackend::perform_save → Invoker (with batch) → callback
//!                              stop on first failure
//! ```

mod backend;
mod batch;
mod callback;
mod entity;
mod invoker;

pub use backend::{BackendCapability, BackendKind, StoreBackend};
pub use batch::BatchController;
pub use callback::{Accumulate, Callback, Capture, Completion, Counting, Gather, Hooks};
pub use entity::{
    Entity, EntityType, FieldClass, FieldDef, FieldKind, FieldValue, Reflect, from_value,
    unknown_field,
};
pub use invoker::{InvocationState, Invoker};
