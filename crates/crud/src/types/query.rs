//! The query model handed to store backends.
//!
//! A [`QueryModel`] names the target entity type and optionally carries a
//! filter [`Expression`], an ordering, and a page window. It is built once per
//! call and never mutated afterwards; the `with_*` methods consume and return
//! a new value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Entity;
use crate::error::{StorageResult, ValidationError};

use super::expression::Expression;

/// Sentinel for `page` and `page_size` meaning "no pagination".
pub const UNPAGINATED: i64 = -1;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (default).
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

/// One ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Dotted field path.
    pub path: String,
    /// Direction for this key.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending on `path`.
    pub fn asc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending on `path`.
    pub fn desc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parses `name` (ascending) or `-name` (descending).
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(path) => Self::desc(path),
            None => Self::asc(s),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.path),
            SortDirection::Descending => write!(f, "-{}", self.path),
        }
    }
}

/// A structured, store-agnostic query.
///
/// `page` is zero-based. `page = -1, page_size = -1` means unpaginated.
///
/// # Example
///
/// ```
/// use helios_crud::types::{Expression, Operator, Predicate, QueryModel, SortSpec};
///
/// let query = QueryModel::new("Person")
///     .with_filter(Expression::leaf(Predicate::new("age", Operator::GreaterThan, 30)))
///     .with_order(SortSpec::parse("-age"))
///     .with_page(0, 20);
///
/// assert!(query.is_paginated());
/// assert_eq!(query.offset(), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryModel {
    target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Expression>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<SortSpec>,
    page: i64,
    page_size: i64,
}

impl QueryModel {
    /// Creates an unfiltered, unpaginated query for `target_type`.
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            filter: None,
            order_by: Vec::new(),
            page: UNPAGINATED,
            page_size: UNPAGINATED,
        }
    }

    /// Creates an unfiltered query for the entity type `T`.
    pub fn for_entity<T: Entity>() -> Self {
        Self::new(T::metadata().name())
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: Expression) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets or clears the filter.
    pub fn with_filter_opt(mut self, filter: Option<Expression>) -> Self {
        self.filter = filter;
        self
    }

    /// Appends an ordering key.
    pub fn with_order(mut self, sort: SortSpec) -> Self {
        self.order_by.push(sort);
        self
    }

    /// Replaces the ordering.
    pub fn with_order_by(mut self, order_by: Vec<SortSpec>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Sets the page window (zero-based page).
    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Returns a copy with pagination removed.
    pub fn unpaginated(&self) -> Self {
        self.clone().with_page(UNPAGINATED, UNPAGINATED)
    }

    /// The target entity type name.
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// The filter; `None` matches everything.
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    /// The ordering keys.
    pub fn order_by(&self) -> &[SortSpec] {
        &self.order_by
    }

    /// The zero-based page, or -1.
    pub fn page(&self) -> i64 {
        self.page
    }

    /// The page size, or -1.
    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Returns true if a page window is set.
    pub fn is_paginated(&self) -> bool {
        self.page != UNPAGINATED || self.page_size != UNPAGINATED
    }

    /// Returns true if there is no filter.
    pub fn matches_all(&self) -> bool {
        self.filter.is_none()
    }

    /// Number of rows to skip, if paginated.
    ///
    /// Saturates at `usize::MAX` when the window lies past any addressable
    /// row, so such a page is simply empty.
    pub fn offset(&self) -> Option<usize> {
        if !self.is_paginated() || self.page < 0 || self.page_size <= 0 {
            return None;
        }
        let offset = self
            .page
            .checked_mul(self.page_size)
            .and_then(|rows| usize::try_from(rows).ok())
            .unwrap_or(usize::MAX);
        Some(offset)
    }

    /// Maximum number of rows to return, if paginated.
    pub fn limit(&self) -> Option<usize> {
        if !self.is_paginated() || self.page_size <= 0 {
            return None;
        }
        Some(usize::try_from(self.page_size).unwrap_or(usize::MAX))
    }

    /// Checks the page window.
    pub fn validate(&self) -> StorageResult<()> {
        if self.is_paginated() && (self.page < 0 || self.page_size <= 0) {
            return Err(ValidationError::InvalidPagination {
                page: self.page,
                page_size: self.page_size,
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for QueryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_type)?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(|s| s.to_string()).collect();
            write!(f, " ORDER BY {}", keys.join(", "))?;
        }
        if self.is_paginated() {
            write!(f, " PAGE {} SIZE {}", self.page, self.page_size)?;
        }
        Ok(())
    }
}
