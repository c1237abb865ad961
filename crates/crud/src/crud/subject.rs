//! Argument shapes accepted by CRUD verbs.

use crate::types::QueryModel;

/// What a CRUD verb operates on.
///
/// Each verb accepts a subset of shapes and rejects the rest with
/// [`ValidationError::UnsupportedArgument`](crate::error::ValidationError::UnsupportedArgument):
///
/// | verb          | `One` | `Many` | `OfType` | `Query` |
/// |---------------|-------|--------|----------|---------|
/// | save / update | yes   | yes    |          |         |
/// | delete        | yes   | yes    | yes      | yes     |
/// | find          | yes   |        |          | yes     |
/// | list          | yes   |        |          | yes     |
/// | count         | yes   |        | yes      | yes     |
///
/// For find, list and count a `One` value is a template: it is compiled into
/// a filter by example.
#[derive(Debug, Clone)]
pub enum Subject<T> {
    /// A single entity, or a template.
    One(T),
    /// A collection, dispatched as a batch.
    Many(Vec<T>),
    /// Every entity of type `T`.
    OfType,
    /// A structured query.
    Query(QueryModel),
}

impl<T> Subject<T> {
    /// A single entity or template.
    pub fn one(item: T) -> Self {
        Subject::One(item)
    }

    /// A collection.
    pub fn many(items: Vec<T>) -> Self {
        Subject::Many(items)
    }

    /// Every entity of the type.
    pub fn of_type() -> Self {
        Subject::OfType
    }

    /// A structured query.
    pub fn query(query: QueryModel) -> Self {
        Subject::Query(query)
    }

    /// Short name of the shape, for logs and errors.
    pub fn shape(&self) -> &'static str {
        match self {
            Subject::One(_) => "a single item",
            Subject::Many(_) => "a collection",
            Subject::OfType => "a bare type",
            Subject::Query(_) => "a query",
        }
    }
}

impl<T> From<Vec<T>> for Subject<T> {
    fn from(items: Vec<T>) -> Self {
        Subject::Many(items)
    }
}

impl<T> From<QueryModel> for Subject<T> {
    fn from(query: QueryModel) -> Self {
        Subject::Query(query)
    }
}
