//! Query-by-example.
//!
//! [`FilterCompiler`] turns a populated template value into an
//! [`Expression`](crate::types::Expression), so that callers can look things
//! up by filling in the fields they care about instead of writing queries.

mod compiler;

pub use compiler::{FieldOperators, FilterCompiler, MAX_PATH_DEPTH};
