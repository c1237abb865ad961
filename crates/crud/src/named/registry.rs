//! Registry of named-query providers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StatementKind, StorageResult, ValidationError};
use crate::named::{QueryProvider, RawStatement, Statement, Variables, bind_query, bind_raw};
use crate::types::QueryModel;

/// Named-query providers, keyed by provider name.
///
/// Resolution looks up the provider, asks it for the statement and binds
/// `${name}` placeholders from the caller's variables. Registering a provider
/// under a name that is already taken replaces the previous one.
#[derive(Default)]
pub struct NamedQueries {
    providers: RwLock<HashMap<String, Arc<dyn QueryProvider>>>,
}

impl fmt::Debug for NamedQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedQueries")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl NamedQueries {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own name.
    pub fn register<P: QueryProvider + 'static>(&self, provider: P) {
        self.register_arc(Arc::new(provider));
    }

    /// Registers a shared provider under its own name.
    pub fn register_arc(&self, provider: Arc<dyn QueryProvider>) {
        let name = provider.name().to_string();
        debug!(provider = %name, "registering query provider");
        self.providers.write().insert(name, provider);
    }

    /// Removes a provider. Returns true if it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.providers.write().remove(name).is_some()
    }

    /// Looks up a provider.
    pub fn provider(&self, name: &str) -> Option<Arc<dyn QueryProvider>> {
        self.providers.read().get(name).cloned()
    }

    /// Registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolves a statement and binds its placeholders.
    pub fn resolve(&self, provider: &str, name: &str, vars: &Variables) -> StorageResult<Statement> {
        let source = self
            .provider(provider)
            .ok_or_else(|| ValidationError::UnknownProvider {
                provider: provider.to_string(),
            })?;
        let statement = source
            .statement(name)
            .ok_or_else(|| ValidationError::UnknownQuery {
                provider: provider.to_string(),
                name: name.to_string(),
            })?;

        match statement {
            Statement::Query(query) => Ok(Statement::Query(bind_query(&query, vars)?)),
            Statement::Raw(raw) => Ok(Statement::Raw(bind_raw(&raw, vars)?)),
        }
    }

    /// Resolves a statement that must be a structured query.
    pub fn resolve_query(
        &self,
        provider: &str,
        name: &str,
        vars: &Variables,
    ) -> StorageResult<QueryModel> {
        match self.resolve(provider, name, vars)? {
            Statement::Query(query) => Ok(query),
            other => Err(wrong_kind(provider, name, StatementKind::Query, other.kind())),
        }
    }

    /// Resolves a statement that must be raw.
    pub fn resolve_raw(
        &self,
        provider: &str,
        name: &str,
        vars: &Variables,
    ) -> StorageResult<RawStatement> {
        match self.resolve(provider, name, vars)? {
            Statement::Raw(raw) => Ok(raw),
            other => Err(wrong_kind(provider, name, StatementKind::Raw, other.kind())),
        }
    }
}

fn wrong_kind(
    provider: &str,
    name: &str,
    expected: StatementKind,
    actual: StatementKind,
) -> crate::error::StorageError {
    ValidationError::WrongStatementType {
        provider: provider.to_string(),
        name: name.to_string(),
        expected,
        actual,
    }
    .into()
}
