//! Expression evaluation against reflected rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::core::{FieldValue, Reflect};
use crate::error::{BackendError, StorageResult};
use crate::types::{Expression, Operator, Predicate, SortDirection, SortSpec};

/// A filter prepared for evaluation against many rows.
///
/// LIKE patterns are compiled once here rather than per row.
pub(crate) struct Matcher<'q> {
    filter: Option<&'q Expression>,
    patterns: HashMap<&'q str, Regex>,
}

impl<'q> Matcher<'q> {
    /// Prepares `filter`. `None` matches every row.
    pub(crate) fn new(filter: Option<&'q Expression>) -> StorageResult<Self> {
        let mut patterns = HashMap::new();
        if let Some(expr) = filter {
            collect_patterns(expr, &mut patterns)?;
        }
        Ok(Self { filter, patterns })
    }

    /// Returns true if `row` satisfies the filter.
    pub(crate) fn matches(&self, row: &dyn Reflect) -> bool {
        self.filter.is_none_or(|expr| self.eval(row, expr))
    }

    fn eval(&self, row: &dyn Reflect, expr: &Expression) -> bool {
        match expr {
            Expression::Leaf(predicate) => self.eval_predicate(row, predicate),
            Expression::And(children) => children.iter().all(|child| self.eval(row, child)),
            Expression::Or(children) => children.iter().any(|child| self.eval(row, child)),
            Expression::Not(child) => !self.eval(row, child),
        }
    }

    fn eval_predicate(&self, row: &dyn Reflect, predicate: &Predicate) -> bool {
        let field = row.get_path(&predicate.path);
        let is_null = match &field {
            FieldValue::Null => true,
            FieldValue::MultiValued(values) => values.is_empty(),
            _ => false,
        };

        match predicate.operator {
            Operator::IsNull => return is_null,
            Operator::IsNotNull => return !is_null,
            _ => {}
        }

        let Some(expected) = &predicate.value else {
            return false;
        };
        let (negated, positive) = match predicate.operator {
            Operator::NotEqualTo => (true, Operator::EqualTo),
            Operator::NotLike => (true, Operator::Like),
            op => (false, op),
        };

        // Comparisons against a missing value are never true, negated or not.
        let hit = match &field {
            FieldValue::Simple(actual) => self.compare(actual, positive, expected),
            FieldValue::MultiValued(values) if !values.is_empty() => values
                .iter()
                .any(|actual| self.compare(actual, positive, expected)),
            _ => return false,
        };
        hit != negated
    }

    fn compare(&self, actual: &Value, operator: Operator, expected: &Value) -> bool {
        match operator {
            Operator::EqualTo => values_equal(actual, expected),
            Operator::LessThan => compare_values(actual, expected) == Some(Ordering::Less),
            Operator::LessThanOrEqualTo => matches!(
                compare_values(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::GreaterThan => compare_values(actual, expected) == Some(Ordering::Greater),
            Operator::GreaterThanOrEqualTo => matches!(
                compare_values(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Like => match (actual, expected) {
                (Value::String(s), Value::String(pattern)) => self
                    .patterns
                    .get(pattern.as_str())
                    .is_some_and(|re| re.is_match(s)),
                _ => false,
            },
            Operator::NotEqualTo | Operator::NotLike | Operator::IsNull | Operator::IsNotNull => {
                false
            }
        }
    }
}

fn collect_patterns<'q>(
    expr: &'q Expression,
    patterns: &mut HashMap<&'q str, Regex>,
) -> StorageResult<()> {
    match expr {
        Expression::Leaf(predicate) => {
            if matches!(predicate.operator, Operator::Like | Operator::NotLike)
                && let Some(Value::String(pattern)) = &predicate.value
                && !patterns.contains_key(pattern.as_str())
            {
                patterns.insert(pattern.as_str(), like_regex(pattern)?);
            }
            Ok(())
        }
        Expression::And(children) | Expression::Or(children) => {
            for child in children {
                collect_patterns(child, patterns)?;
            }
            Ok(())
        }
        Expression::Not(child) => collect_patterns(child, patterns),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Orders two scalars of the same kind. Mixed kinds are incomparable.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Some(x.as_f64()?.total_cmp(&y.as_f64()?)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Translates a `%`/`_` wildcard pattern into an anchored regex.
pub(crate) fn like_regex(pattern: &str) -> StorageResult<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("(?s)^");
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '%' | '_' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if c == '%' { ".*" } else { "." });
            }
            c => literal.push(c),
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');
    Regex::new(&source).map_err(|e| BackendError::failed("memory", "like", e).into())
}

/// Orders rows by the given keys. Rows missing a key sort first.
pub(crate) fn compare_rows(a: &dyn Reflect, b: &dyn Reflect, order_by: &[SortSpec]) -> Ordering {
    for sort in order_by {
        let va = a.get_path(&sort.path);
        let vb = b.get_path(&sort.path);
        let ord = match (va.as_simple(), vb.as_simple()) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return match sort.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
        }
    }
    Ordering::Equal
}
