//! Boolean filter expressions.
//!
//! An [`Expression`] is the structured form of a filter: leaves compare one
//! field path against a value, and `And`/`Or`/`Not` combine them. Store
//! adapters translate expressions into their native query language.
//!
//! `And` and `Or` nodes always hold at least two children. The child list type,
//! [`Children`], can only be built through [`Expression::and`] and
//! [`Expression::or`], which reject degenerate lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageResult, ValidationError};

/// Comparison operators available to filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Field equals value (default).
    #[default]
    EqualTo,
    /// Field differs from value.
    NotEqualTo,
    /// Field is less than value.
    LessThan,
    /// Field is less than or equal to value.
    LessThanOrEqualTo,
    /// Field is greater than value.
    GreaterThan,
    /// Field is greater than or equal to value.
    GreaterThanOrEqualTo,
    /// Field matches a `%`/`_` wildcard pattern.
    Like,
    /// Field does not match a `%`/`_` wildcard pattern.
    NotLike,
    /// Field has no value.
    IsNull,
    /// Field has a value.
    IsNotNull,
}

impl Operator {
    /// All operators, in declaration order.
    pub const ALL: [Operator; 10] = [
        Operator::EqualTo,
        Operator::NotEqualTo,
        Operator::LessThan,
        Operator::LessThanOrEqualTo,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqualTo,
        Operator::Like,
        Operator::NotLike,
        Operator::IsNull,
        Operator::IsNotNull,
    ];

    /// Returns true for `IsNull` and `IsNotNull`.
    pub fn is_null_check(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// Returns true if the operator compares against a value.
    pub fn takes_value(&self) -> bool {
        !self.is_null_check()
    }

    /// SQL-like rendering used by [`Expression`]'s `Display`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::EqualTo => "=",
            Operator::NotEqualTo => "<>",
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::EqualTo => "EQUAL_TO",
            Operator::NotEqualTo => "NOT_EQUAL_TO",
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanOrEqualTo => "LESS_THAN_OR_EQUAL_TO",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanOrEqualTo => "GREATER_THAN_OR_EQUAL_TO",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT_LIKE",
            Operator::IsNull => "IS_NULL",
            Operator::IsNotNull => "IS_NOT_NULL",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.to_string().eq_ignore_ascii_case(s) || op.symbol() == s)
            .ok_or_else(|| format!("unknown operator: {}", s))
    }
}

/// A single comparison: `path operator value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Dotted field path, e.g. `address.city`.
    pub path: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The compared value; `None` for null checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Predicate {
    /// Creates a predicate comparing `path` against `value`.
    pub fn new(path: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// Creates a value-less predicate (used for null checks).
    pub fn without_value(path: impl Into<String>, operator: Operator) -> Self {
        Self {
            path: path.into(),
            operator,
            value: None,
        }
    }

    /// `path IS NULL`.
    pub fn is_null(path: impl Into<String>) -> Self {
        Self::without_value(path, Operator::IsNull)
    }

    /// `path IS NOT NULL`.
    pub fn is_not_null(path: impl Into<String>) -> Self {
        Self::without_value(path, Operator::IsNotNull)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) if self.operator.takes_value() => {
                write!(f, "{} {} {}", self.path, self.operator.symbol(), value)
            }
            _ => write!(f, "{} {}", self.path, self.operator.symbol()),
        }
    }
}

/// Children of an `And`/`Or` node. Always holds at least two expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Children(Vec<Expression>);

impl Children {
    /// Returns the children as a slice.
    pub fn as_slice(&self) -> &[Expression] {
        &self.0
    }

    /// Iterates over the children.
    pub fn iter(&self) -> std::slice::Iter<'_, Expression> {
        self.0.iter()
    }

    /// Number of children (never less than 2).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the list.
    pub fn into_vec(self) -> Vec<Expression> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A boolean filter expression tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    /// A single comparison.
    Leaf(Predicate),
    /// All children must match.
    And(Children),
    /// At least one child must match.
    Or(Children),
    /// The child must not match.
    Not(Box<Expression>),
}

impl Expression {
    /// Wraps a predicate.
    pub fn leaf(predicate: Predicate) -> Self {
        Expression::Leaf(predicate)
    }

    /// Builds a conjunction; fails with fewer than two children.
    pub fn and(children: Vec<Expression>) -> StorageResult<Self> {
        Ok(Expression::And(Self::children("AND", children)?))
    }

    /// Builds a disjunction; fails with fewer than two children.
    pub fn or(children: Vec<Expression>) -> StorageResult<Self> {
        Ok(Expression::Or(Self::children("OR", children)?))
    }

    /// Negates an expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Expression) -> Self {
        Expression::Not(Box::new(child))
    }

    /// Conjunction that never produces a degenerate node.
    ///
    /// Zero expressions yield `None` ("match all"), one expression is returned
    /// as is, and two or more are wrapped in a single `And`.
    pub fn all_of(mut expressions: Vec<Expression>) -> Option<Self> {
        match expressions.len() {
            0 => None,
            1 => expressions.pop(),
            _ => Some(Expression::And(Children(expressions))),
        }
    }

    fn children(kind: &'static str, children: Vec<Expression>) -> StorageResult<Children> {
        if children.len() < 2 {
            return Err(ValidationError::DegenerateExpression {
                kind,
                count: children.len(),
            }
            .into());
        }
        Ok(Children(children))
    }

    /// Returns the predicate if this is a leaf.
    pub fn as_leaf(&self) -> Option<&Predicate> {
        match self {
            Expression::Leaf(predicate) => Some(predicate),
            _ => None,
        }
    }

    /// Collects all leaf predicates in depth-first order.
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            Expression::Leaf(predicate) => out.push(predicate),
            Expression::And(children) | Expression::Or(children) => {
                for child in children {
                    child.collect_predicates(out);
                }
            }
            Expression::Not(child) => child.collect_predicates(out),
        }
    }

    /// Rebuilds the tree with every leaf value passed through `f`.
    pub fn try_map_values<F>(&self, f: &mut F) -> StorageResult<Expression>
    where
        F: FnMut(&Value) -> StorageResult<Value>,
    {
        Ok(match self {
            Expression::Leaf(predicate) => {
                let value = match &predicate.value {
                    Some(value) => Some(f(value)?),
                    None => None,
                };
                Expression::Leaf(Predicate {
                    path: predicate.path.clone(),
                    operator: predicate.operator,
                    value,
                })
            }
            Expression::And(children) => Expression::And(Children(
                children
                    .iter()
                    .map(|c| c.try_map_values(f))
                    .collect::<StorageResult<_>>()?,
            )),
            Expression::Or(children) => Expression::Or(Children(
                children
                    .iter()
                    .map(|c| c.try_map_values(f))
                    .collect::<StorageResult<_>>()?,
            )),
            Expression::Not(child) => Expression::Not(Box::new(child.try_map_values(f)?)),
        })
    }
}

impl From<Predicate> for Expression {
    fn from(predicate: Predicate) -> Self {
        Expression::Leaf(predicate)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(
            f: &mut fmt::Formatter<'_>,
            children: &Children,
            separator: &str,
        ) -> fmt::Result {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", separator)?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, ")")
        }

        match self {
            Expression::Leaf(predicate) => write!(f, "{}", predicate),
            Expression::And(children) => join(f, children, "AND"),
            Expression::Or(children) => join(f, children, "OR"),
            Expression::Not(child) => write!(f, "NOT {}", child),
        }
    }
}
