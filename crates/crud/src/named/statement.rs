//! Named statements and the provider contract.

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::error::StatementKind;
use crate::types::QueryModel;

/// A store-native statement, passed to the backend verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatement {
    text: String,
}

impl RawStatement {
    /// Wraps statement text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The statement text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for RawStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// What a named query resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A structured query, run through the normal list path.
    Query(QueryModel),
    /// A raw statement, executed by backends that support it.
    Raw(RawStatement),
}

impl Statement {
    /// The statement's shape.
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Query(_) => StatementKind::Query,
            Statement::Raw(_) => StatementKind::Raw,
        }
    }
}

/// A source of named statements.
///
/// Providers are registered by [`name`](Self::name) in
/// [`NamedQueries`](crate::named::NamedQueries). How statements are loaded
/// (files, configuration, code) is up to the provider.
pub trait QueryProvider: Send + Sync + Debug {
    /// Registration name.
    fn name(&self) -> &str;

    /// Looks up a statement. Placeholders are left unbound.
    fn statement(&self, name: &str) -> Option<Statement>;

    /// Names of all statements this provider knows, if it can list them.
    fn statement_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A provider backed by an in-memory map.
#[derive(Debug, Clone)]
pub struct MapQueryProvider {
    name: String,
    statements: BTreeMap<String, Statement>,
}

impl MapQueryProvider {
    /// Creates an empty provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements: BTreeMap::new(),
        }
    }

    /// Adds a structured query.
    pub fn with_query(mut self, name: impl Into<String>, query: QueryModel) -> Self {
        self.statements.insert(name.into(), Statement::Query(query));
        self
    }

    /// Adds a raw statement.
    pub fn with_raw(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.statements
            .insert(name.into(), Statement::Raw(RawStatement::new(text)));
        self
    }
}

impl QueryProvider for MapQueryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn statement(&self, name: &str) -> Option<Statement> {
        self.statements.get(name).cloned()
    }

    fn statement_names(&self) -> Vec<String> {
        self.statements.keys().cloned().collect()
    }
}
