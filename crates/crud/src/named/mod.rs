//! Named queries.
//!
//! Statements are looked up by `(provider, name)` in a [`NamedQueries`]
//! registry instead of being written at the call site. A statement is either
//! a structured [`QueryModel`](crate::types::QueryModel), which runs through
//! the normal list path, or a [`RawStatement`] handed to the backend verbatim.
//! Both may contain `${name}` placeholders bound from [`Variables`].
//!
//! ```
//! use helios_crud::named::{MapQueryProvider, NamedQueries, Variables};
//! use helios_crud::types::QueryModel;
//!
//! let registry = NamedQueries::new();
//! registry.register(
//!     MapQueryProvider::new("people")
//!         .with_query("everyone", QueryModel::new("Person"))
//!         .with_raw("retire", "UPDATE person SET retired = true WHERE age > ${age}"),
//! );
//!
//! let vars = Variables::from([("age".to_string(), serde_json::json!(65))]);
//! let raw = registry.resolve_raw("people", "retire", &vars).unwrap();
//! assert_eq!(raw.text(), "UPDATE person SET retired = true WHERE age > 65");
//! ```

mod placeholder;
mod registry;
mod statement;

pub use placeholder::{Variables, bind_query, bind_raw, bind_value};
pub use registry::NamedQueries;
pub use statement::{MapQueryProvider, QueryProvider, RawStatement, Statement};
