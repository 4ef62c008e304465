//! Object position of a triple: a resource reference or a literal.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::StoreId;

/// A triple object.
///
/// Covers the literal types restrictions and annotations carry, plus
/// references to other resources (classes, individuals, blank nodes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Resource(StoreId),
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    LangString { text: String, lang: String },
}

// ============================================================================
// Equality and hashing
//
// Floats compare bitwise so values can key the store's object index.
// ============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Resource(a), Value::Resource(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::LangString { text: a, lang: la },
                Value::LangString { text: b, lang: lb },
            ) => a == b && la == lb,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Resource(id) => id.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::LangString { text, lang } => {
                text.hash(state);
                lang.hash(state);
            }
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Resource(_) => "RESOURCE",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::LangString { .. } => "LANG_STRING",
        }
    }

    pub fn is_resource(&self) -> bool { matches!(self, Value::Resource(_)) }

    pub fn as_resource(&self) -> Option<&StoreId> {
        match self {
            Value::Resource(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::LangString { text, .. } => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<u32> for Value { fn from(v: u32) -> Self { Value::Int(v as i64) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<StoreId> for Value { fn from(v: StoreId) -> Self { Value::Resource(v) } }
impl From<&StoreId> for Value { fn from(v: &StoreId) -> Self { Value::Resource(v.clone()) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Resource(id) => write!(f, "<{id}>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::LangString { text, lang } => {
                write!(f, "\"{}\"@{lang}", text.replace('"', "\\\""))
            }
        }
    }
}
