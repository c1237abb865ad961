//! `${name}` placeholder binding.
//!
//! In raw statement text, a placeholder is replaced by the variable rendered
//! as a literal: strings are single-quoted with embedded quotes doubled, null
//! becomes `NULL`, numbers and booleans are written as is.
//!
//! In a query's filter, a string leaf value that is exactly one placeholder
//! takes the variable's JSON value (so `"${age}"` can bind the number `30`).
//! Placeholders embedded in longer strings are replaced by the variable's
//! plain text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{BackendError, StorageResult, ValidationError};
use crate::named::RawStatement;
use crate::types::QueryModel;

/// Variable bindings for placeholders.
pub type Variables = BTreeMap<String, Value>;

static PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}"));

fn pattern() -> StorageResult<&'static Regex> {
    PLACEHOLDER
        .as_ref()
        .map_err(|e| BackendError::failed("named-queries", "compile placeholder pattern", e).into())
}

fn lookup<'v>(vars: &'v Variables, name: &str) -> StorageResult<&'v Value> {
    vars.get(name).ok_or_else(|| {
        ValidationError::UnboundPlaceholder {
            name: name.to_string(),
        }
        .into()
    })
}

/// Replaces every placeholder in `text`, rendering each value with `render`.
fn replace(text: &str, vars: &Variables, render: fn(&Value) -> String) -> StorageResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in pattern()?.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&render(lookup(vars, name.as_str())?));
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Binds placeholders in raw statement text.
pub fn bind_raw(statement: &RawStatement, vars: &Variables) -> StorageResult<RawStatement> {
    Ok(RawStatement::new(replace(statement.text(), vars, literal)?))
}

/// Binds placeholders in one filter value.
pub fn bind_value(value: &Value, vars: &Variables) -> StorageResult<Value> {
    match value {
        Value::String(s) => {
            if let Some(caps) = pattern()?.captures(s) {
                if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
                    if whole.start() == 0 && whole.end() == s.len() {
                        return lookup(vars, name.as_str()).cloned();
                    }
                }
            }
            Ok(Value::String(replace(s, vars, plain)?))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| bind_value(item, vars))
            .collect::<StorageResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Binds placeholders in every leaf value of a query's filter.
pub fn bind_query(query: &QueryModel, vars: &Variables) -> StorageResult<QueryModel> {
    let filter = match query.filter() {
        Some(filter) => Some(filter.try_map_values(&mut |v: &Value| bind_value(v, vars))?),
        None => None,
    };
    Ok(query.clone().with_filter_opt(filter))
}
