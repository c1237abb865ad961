//! Helios CRUD
//!
//! Store-agnostic create/read/update/delete orchestration. Callers work with
//! plain entity values; a [`StoreBackend`](core::StoreBackend) adapter does
//! the actual persistence.
//!
//! # Features
//!
//! - **Query by example**: a partially populated entity is compiled into a
//!   filter [`Expression`](types::Expression), with per-field operator
//!   overrides
//! - **Batches**: collections go to the backend's native batch operation when
//!   it has one, or are iterated element by element with fail-fast semantics
//!   and progress tracking
//! - **Callbacks or blocking calls**: every verb has a callback form and a
//!   blocking form that share one code path
//! - **Named queries**: statements registered under `(provider, name)` with
//!   `${var}` placeholders
//! - **Capability fallbacks**: count, query delete and pagination are
//!   emulated when the backend does not offer them natively
//!
//! # Architecture
//!
//! - [`types`] - Filter expressions and the query model
//! - [`core`] - Backend contract, entity metadata, callbacks, batch progress
//! - [`filter`] - Query-by-example compiler
//! - [`named`] - Named query registry and placeholder binding
//! - [`crud`] - The orchestrator and its async wrapper
//! - [`backends`] - Backend implementations
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use helios_crud::backends::memory::MemoryBackend;
//! use helios_crud::core::{Entity, EntityType, FieldDef, FieldValue, Reflect, from_value, unknown_field};
//! use helios_crud::crud::{Crud, Subject};
//! use helios_crud::error::StorageResult;
//! use serde_json::Value;
//!
//! static PERSON: EntityType = EntityType::new(
//!     "Person",
//!     &[FieldDef::simple("id"), FieldDef::simple("name"), FieldDef::simple("age")],
//! )
//! .with_key("id");
//!
//! #[derive(Debug, Clone, Default)]
//! struct Person {
//!     id: Option<i64>,
//!     name: Option<String>,
//!     age: Option<i64>,
//! }
//!
//! impl Reflect for Person {
//!     fn entity_type(&self) -> &'static EntityType {
//!         &PERSON
//!     }
//!
//!     fn get_field(&self, name: &str) -> FieldValue<'_> {
//!         match name {
//!             "id" => FieldValue::optional(self.id),
//!             "name" => FieldValue::optional(self.name.clone()),
//!             "age" => FieldValue::optional(self.age),
//!             _ => FieldValue::Null,
//!         }
//!     }
//! }
//!
//! impl Entity for Person {
//!     fn metadata() -> &'static EntityType {
//!         &PERSON
//!     }
//!
//!     fn set_field(&mut self, name: &str, value: Value) -> StorageResult<()> {
//!         match name {
//!             "id" => self.id = from_value(&PERSON, name, value)?,
//!             "name" => self.name = from_value(&PERSON, name, value)?,
//!             "age" => self.age = from_value(&PERSON, name, value)?,
//!             _ => return Err(unknown_field(&PERSON, name)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let crud = Crud::new(MemoryBackend::new());
//! let steve = crud.save(Person { name: Some("Steve".into()), age: Some(41), ..Default::default() })?;
//! assert!(steve.id.is_some());
//!
//! // Only populated fields become predicates.
//! let template = Person { name: Some("Steve".into()), ..Default::default() };
//! let found = crud.find(&template)?;
//! assert_eq!(found.and_then(|p| p.age), Some(41));
//!
//! assert_eq!(crud.count(Subject::<Person>::of_type())?, 1);
//! assert_eq!(crud.delete(Subject::<Person>::of_type())?, 1);
//! # Ok::<(), helios_crud::StorageError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod crud;
pub mod error;
pub mod filter;
pub mod named;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{Expression, Operator, Predicate, QueryModel};

// Re-export core traits
pub use core::{BackendCapability, BackendKind, Callback, Entity, Reflect, StoreBackend};
pub use crud::{AsyncCrud, Crud, CrudConfig, Subject};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
