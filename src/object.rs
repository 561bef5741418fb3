//! PDF value model.
//!
//! A single tagged union covers every value the serializer understands, so a
//! bare identifier (`Name`), a literal string (`Text`), raw bytes
//! (`ByteString`) and a mapping (`Dictionary`) can never be confused.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Insertion-ordered dictionary.
pub type Dictionary = IndexMap<String, Object>;

/// Sorted associative structure used for name trees (`/EmbeddedFiles`).
pub type NameTree = BTreeMap<String, Object>;

/// PDF value representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value, range checked at serialization
    Real(f64),
    /// Name (serialized with a leading /)
    Name(String),
    /// Literal text string, wide-encoded when it contains non-ASCII characters
    Text(String),
    /// Raw bytes, serialized as a hex string
    ByteString(Vec<u8>),
    /// Date, serialized as `(D:YYYYMMDDHHmmssZ)`
    Date(DateTime<Utc>),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary preserving key insertion order
    Dictionary(Dictionary),
    /// Indirect object reference
    Reference(ObjectRef),
    /// Name tree with sorted keys
    Tree(NameTree),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Create a Name object.
    pub fn name(s: impl Into<String>) -> Self {
        Object::Name(s.into())
    }

    /// Create a Text object.
    pub fn text(s: impl Into<String>) -> Self {
        Object::Text(s.into())
    }

    /// Create a Dictionary object from ordered entries.
    pub fn dict(entries: Vec<(&str, Object)>) -> Self {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Create an array of four numbers `[llx lly urx ury]`.
    pub fn rect(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Object::Array(vec![
            Object::Real(llx),
            Object::Real(lly),
            Object::Real(urx),
            Object::Real(ury),
        ])
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to a mutable dictionary.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<f64> for Object {
    fn from(r: f64) -> Self {
        Object::Real(r)
    }
}

impl From<ObjectRef> for Object {
    fn from(r: ObjectRef) -> Self {
        Object::Reference(r)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}

impl From<Vec<Object>> for Object {
    fn from(items: Vec<Object>) -> Self {
        Object::Array(items)
    }
}

impl From<DateTime<Utc>> for Object {
    fn from(date: DateTime<Utc>) -> Self {
        Object::Date(date)
    }
}
