//! Core data types: filter expressions and the query model.
//!
//! - [`Expression`], [`Predicate`], [`Operator`] - Boolean filter trees
//! - [`QueryModel`], [`SortSpec`] - What a store backend is asked to run
//!
//! # Example
//!
//! ```
//! use helios_crud::types::{Expression, Operator, Predicate, QueryModel};
//!
//! let filter = Expression::and(vec![
//!     Predicate::new("name", Operator::EqualTo, "Steve").into(),
//!     Predicate::new("age", Operator::GreaterThan, 30).into(),
//! ])
//! .unwrap();
//!
//! let query = QueryModel::new("Person").with_filter(filter);
//! assert_eq!(query.to_string(), "Person WHERE (name = \"Steve\" AND age > 30)");
//! ```

mod expression;
mod query;

pub use expression::{Children, Expression, Operator, Predicate};
pub use query::{QueryModel, SortDirection, SortSpec, UNPAGINATED};
