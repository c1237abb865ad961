//! By-example filter compiler.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::{EntityType, FieldKind, FieldValue, Reflect};
use crate::error::{StorageResult, ValidationError};
use crate::types::{Expression, Operator, Predicate};

/// Per-path operator overrides. Paths not listed compare with `EqualTo`.
pub type FieldOperators = BTreeMap<String, Operator>;

/// Maximum composite nesting followed while compiling.
pub const MAX_PATH_DEPTH: usize = 32;

type FieldFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Turns a template value into a filter [`Expression`].
///
/// Every populated simple field of the template becomes one leaf comparing
/// the field's dotted path against its value. Composite fields are walked
/// recursively and contribute leaves to the same conjunction; multi-valued
/// fields are ignored. A null field contributes nothing unless its override
/// is `IsNull` or `IsNotNull`.
///
/// The result is `None` when no leaf was produced (match everything), the
/// bare leaf when exactly one was produced, and a single `And` otherwise.
/// Fields are visited in declaration order, so equal inputs always compile
/// to equal trees.
///
/// # Example
///
/// ```ignore
/// use helios_crud::filter::FilterCompiler;
/// use helios_crud::types::Operator;
///
/// let template = Person { name: Some("Steve".into()), age: Some(30), ..Default::default() };
/// let compiler = FilterCompiler::new().with_operator("age", Operator::GreaterThan);
///
/// let filter = compiler.compile(&template).unwrap();
/// assert_eq!(filter.to_string(), "(name = \"Steve\" AND age > 30)");
/// ```
#[derive(Clone, Default)]
pub struct FilterCompiler {
    operators: FieldOperators,
    should_process: Option<FieldFilter>,
}

impl fmt::Debug for FilterCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCompiler")
            .field("operators", &self.operators)
            .field("field_filter", &self.should_process.is_some())
            .finish()
    }
}

impl FilterCompiler {
    /// Creates a compiler with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the operator for one dotted path.
    pub fn with_operator(mut self, path: impl Into<String>, operator: Operator) -> Self {
        self.operators.insert(path.into(), operator);
        self
    }

    /// Adds several overrides at once.
    pub fn with_operators(mut self, operators: FieldOperators) -> Self {
        self.operators.extend(operators);
        self
    }

    /// Skips every path for which `should_process` returns false.
    ///
    /// A rejected composite path skips its whole subtree.
    pub fn with_field_filter<F>(mut self, should_process: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.should_process = Some(Arc::new(should_process));
        self
    }

    /// The configured overrides.
    pub fn operators(&self) -> &FieldOperators {
        &self.operators
    }

    /// The operator applied to `path`.
    pub fn operator_for(&self, path: &str) -> Operator {
        self.operators.get(path).copied().unwrap_or_default()
    }

    fn accepts(&self, path: &str) -> bool {
        self.should_process.as_ref().is_none_or(|f| f(path))
    }

    /// Compiles a template value.
    pub fn compile(&self, template: &dyn Reflect) -> Option<Expression> {
        let mut leaves = Vec::new();
        self.collect_value(template, None, 0, &mut leaves);
        debug!(
            entity_type = template.entity_type().name(),
            leaves = leaves.len(),
            "compiled template filter"
        );
        Expression::all_of(leaves)
    }

    fn collect_value(
        &self,
        value: &dyn Reflect,
        prefix: Option<&str>,
        depth: usize,
        leaves: &mut Vec<Expression>,
    ) {
        for field in value.entity_type().fields() {
            let path = join_path(prefix, field.name());
            if !self.accepts(&path) {
                continue;
            }
            let overridden = self.operators.get(&path).copied();

            match value.get_field(field.name()) {
                FieldValue::Null => {
                    if let Some(op) = overridden.filter(Operator::is_null_check) {
                        leaves.push(Predicate::without_value(path, op).into());
                    }
                }
                FieldValue::Simple(v) => {
                    let op = overridden.unwrap_or_default();
                    let predicate = if op.is_null_check() {
                        Predicate::without_value(path, op)
                    } else {
                        Predicate::new(path, op, v)
                    };
                    leaves.push(predicate.into());
                }
                FieldValue::Composite(nested) => {
                    if let Some(op) = overridden.filter(Operator::is_null_check) {
                        leaves.push(Predicate::without_value(path.clone(), op).into());
                    }
                    if depth < MAX_PATH_DEPTH {
                        self.collect_value(nested, Some(&path), depth + 1, leaves);
                    }
                }
                FieldValue::MultiValued(_) => {}
            }
        }
    }

    /// Compiles a filter for a bare type, with no template value.
    ///
    /// Only `IsNull` and `IsNotNull` overrides are meaningful without values;
    /// any other override fails with [`ValidationError::InvalidOperator`].
    pub fn compile_type(&self, entity_type: &EntityType) -> StorageResult<Option<Expression>> {
        if let Some((path, op)) = self.operators.iter().find(|(_, op)| !op.is_null_check()) {
            return Err(ValidationError::InvalidOperator {
                entity_type: entity_type.name().to_string(),
                path: path.clone(),
                operator: *op,
            }
            .into());
        }

        let mut leaves = Vec::new();
        self.collect_type(entity_type, None, 0, &mut leaves);
        debug!(
            entity_type = entity_type.name(),
            leaves = leaves.len(),
            "compiled type filter"
        );
        Ok(Expression::all_of(leaves))
    }

    fn collect_type(
        &self,
        entity_type: &EntityType,
        prefix: Option<&str>,
        depth: usize,
        leaves: &mut Vec<Expression>,
    ) {
        for field in entity_type.fields() {
            let path = join_path(prefix, field.name());
            if !self.accepts(&path) {
                continue;
            }
            if let Some(op) = self.operators.get(&path) {
                leaves.push(Predicate::without_value(path.clone(), *op).into());
            }
            if let FieldKind::Composite(nested) = field.kind() {
                if depth < MAX_PATH_DEPTH {
                    self.collect_type(nested(), Some(&path), depth + 1, leaves);
                }
            }
        }
    }
}

fn join_path(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, name),
        None => name.to_string(),
    }
}
