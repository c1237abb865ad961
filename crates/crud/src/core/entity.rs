//! Entity metadata capability.
//!
//! The filter compiler and the reference backend never look at concrete
//! entity types. They work through three capabilities:
//!
//! - [`EntityType`] lists the fields of a type in declaration order and
//!   classifies each one ([`FieldKind`]).
//! - [`Reflect`] reads a field of a live value by name.
//! - [`Entity`] writes a field by name and exposes the type statically.
//!
//! Metadata is declared once per type as a `static`:
//!
//! ```
//! use helios_crud::core::{EntityType, FieldDef};
//!
//! static ADDRESS: EntityType = EntityType::new(
//!     "Address",
//!     &[FieldDef::simple("city"), FieldDef::simple("zip")],
//! );
//!
//! static PERSON: EntityType = EntityType::new(
//!     "Person",
//!     &[
//!         FieldDef::simple("id"),
//!         FieldDef::simple("name"),
//!         FieldDef::composite("address", || &ADDRESS),
//!         FieldDef::multi_valued("tags"),
//!     ],
//! )
//! .with_key("id");
//!
//! assert_eq!(PERSON.key(), Some("id"));
//! assert_eq!(PERSON.resolve_path("address.city").map(|f| f.name()), Some("city"));
//! ```

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{StorageError, StorageResult, ValidationError};

/// Coarse classification of a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldClass {
    /// A scalar that maps to a single JSON value.
    Simple,
    /// A nested object with its own fields.
    Composite,
    /// A collection of values.
    MultiValued,
}

/// Declared kind of a field.
///
/// Composite fields carry a function returning the nested type's metadata so
/// that types can refer to each other (or themselves) from `static` items.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A scalar.
    Simple,
    /// A nested object of the returned type.
    Composite(fn() -> &'static EntityType),
    /// A collection.
    MultiValued,
}

impl FieldKind {
    /// Classifies the field.
    pub fn class(&self) -> FieldClass {
        match self {
            FieldKind::Simple => FieldClass::Simple,
            FieldKind::Composite(_) => FieldClass::Composite,
            FieldKind::MultiValued => FieldClass::MultiValued,
        }
    }

    /// Nested type metadata for composite fields.
    pub fn nested(&self) -> Option<&'static EntityType> {
        match self {
            FieldKind::Composite(nested) => Some(nested()),
            _ => None,
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    name: &'static str,
    kind: FieldKind,
}

impl FieldDef {
    /// A scalar field.
    pub const fn simple(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Simple,
        }
    }

    /// A nested object field.
    pub const fn composite(name: &'static str, nested: fn() -> &'static EntityType) -> Self {
        Self {
            name,
            kind: FieldKind::Composite(nested),
        }
    }

    /// A collection field.
    pub const fn multi_valued(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::MultiValued,
        }
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Shorthand for `kind().class()`.
    pub fn class(&self) -> FieldClass {
        self.kind.class()
    }
}

/// Static description of an entity type.
#[derive(Debug)]
pub struct EntityType {
    name: &'static str,
    key: Option<&'static str>,
    fields: &'static [FieldDef],
}

impl EntityType {
    /// Declares a type with its fields in declaration order.
    pub const fn new(name: &'static str, fields: &'static [FieldDef]) -> Self {
        Self {
            name,
            key: None,
            fields,
        }
    }

    /// Names the key field.
    pub const fn with_key(self, key: &'static str) -> Self {
        Self {
            name: self.name,
            key: Some(key),
            fields: self.fields,
        }
    }

    /// Type name, used as the query target.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Key field name, if the type has one.
    pub fn key(&self) -> Option<&'static str> {
        self.key
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    /// Looks up a direct field.
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a dotted path through composite fields.
    pub fn resolve_path(&self, path: &str) -> Option<&'static FieldDef> {
        match path.split_once('.') {
            None => self.field(path),
            Some((head, rest)) => self.field(head)?.kind.nested()?.resolve_path(rest),
        }
    }
}

/// The value of one field of a live entity.
#[derive(Clone)]
pub enum FieldValue<'a> {
    /// No value.
    Null,
    /// A scalar.
    Simple(Value),
    /// A nested object.
    Composite(&'a dyn Reflect),
    /// A collection of scalars.
    MultiValued(Vec<Value>),
}

impl<'a> FieldValue<'a> {
    /// A scalar; JSON `null` becomes [`FieldValue::Null`].
    pub fn simple(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => FieldValue::Null,
            value => FieldValue::Simple(value),
        }
    }

    /// A scalar that may be absent.
    pub fn optional<V: Into<Value>>(value: Option<V>) -> Self {
        value.map_or(FieldValue::Null, Self::simple)
    }

    /// A nested object that may be absent.
    pub fn composite<R: Reflect>(value: Option<&'a R>) -> Self {
        match value {
            Some(value) => FieldValue::Composite(value),
            None => FieldValue::Null,
        }
    }

    /// A collection of scalars.
    pub fn multi<V: Clone + Into<Value>>(values: &[V]) -> Self {
        FieldValue::MultiValued(values.iter().cloned().map(Into::into).collect())
    }

    /// Returns true for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the scalar, if this is one.
    pub fn as_simple(&self) -> Option<&Value> {
        match self {
            FieldValue::Simple(value) => Some(value),
            _ => None,
        }
    }
}

impl Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => write!(f, "Null"),
            FieldValue::Simple(value) => f.debug_tuple("Simple").field(value).finish(),
            FieldValue::Composite(nested) => {
                write!(f, "Composite({})", nested.entity_type().name())
            }
            FieldValue::MultiValued(values) => f.debug_tuple("MultiValued").field(values).finish(),
        }
    }
}

/// Read access to the fields of a value by name.
pub trait Reflect: Send + Sync {
    /// Metadata of this value's type.
    fn entity_type(&self) -> &'static EntityType;

    /// Reads a direct field. Unknown names read as [`FieldValue::Null`].
    fn get_field(&self, name: &str) -> FieldValue<'_>;

    /// Reads a dotted path through composite fields.
    fn get_path(&self, path: &str) -> FieldValue<'_> {
        match path.split_once('.') {
            None => self.get_field(path),
            Some((head, rest)) => match self.get_field(head) {
                FieldValue::Composite(nested) => nested.get_path(rest),
                _ => FieldValue::Null,
            },
        }
    }
}

/// A storable entity.
///
/// Implementors pair [`Reflect`] with write access so that stores can assign
/// generated keys.
pub trait Entity: Reflect + Clone + Debug + 'static {
    /// Metadata of the type.
    fn metadata() -> &'static EntityType;

    /// Assigns a direct field from a JSON value.
    fn set_field(&mut self, name: &str, value: Value) -> StorageResult<()>;

    /// The key value, if the type declares a key and it is set.
    fn key(&self) -> Option<Value> {
        let key = Self::metadata().key()?;
        match self.get_field(key) {
            FieldValue::Simple(value) => Some(value),
            _ => None,
        }
    }
}

/// Converts a JSON value for assignment to `entity_type.field`.
///
/// Intended for [`Entity::set_field`] implementations.
pub fn from_value<V: DeserializeOwned>(
    entity_type: &EntityType,
    field: &str,
    value: Value,
) -> StorageResult<V> {
    serde_json::from_value(value).map_err(|e| {
        ValidationError::InvalidFieldValue {
            entity_type: entity_type.name().to_string(),
            field: field.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Error for a `set_field` call naming an unknown field.
pub fn unknown_field(entity_type: &EntityType, field: &str) -> StorageError {
    ValidationError::UnknownField {
        entity_type: entity_type.name().to_string(),
        field: field.to_string(),
    }
    .into()
}
