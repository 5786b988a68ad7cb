//! Runtime values for expression evaluation.
//!
//! This module provides:
//!
//! - **Value**: the dynamically-typed value produced and consumed by functions
//! - **ValueType**: the closed set of semantic result types and the
//!   compatibility check between a produced and an expected type
//! - **coerce**: the type-safe coercion, equality and ordering rules
//! - **object**: the property capabilities (`Resolvable`, `Changeable`) that
//!   `get`/`set` dispatch through

pub mod coerce;
pub mod object;
pub mod types;

pub use object::{Changeable, ObjectValue, PropertyError, Resolvable};
pub use types::{assert_compatible, ValueType};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Values that flow through expression evaluation
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Milliseconds since the Unix epoch
    Date(i64),
    Collection(Vec<Value>),
    /// A collection produced by resolving a property path through an
    /// intermediate collection; items keep their per-branch structure.
    Nested(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Arc<dyn ObjectValue>),
    /// Sentinel returned by functions evaluated for effect only
    Assignment,
}

impl Value {
    /// Get the semantic type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) | Value::Float(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Date(_) => ValueType::Date,
            Value::Collection(_) | Value::Nested(_) | Value::Map(_) => ValueType::Collection,
            Value::Object(_) => ValueType::Any,
            Value::Assignment => ValueType::Assignment,
        }
    }

    pub fn string(val: impl Into<String>) -> Self {
        Value::String(val.into())
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Collection(items.into_iter().map(Into::into).collect())
    }

    pub fn object(obj: impl ObjectValue + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value is classified as integral for numeric promotion
    pub fn is_integral(&self) -> bool {
        matches!(self, Value::Integer(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            (Value::Nested(a), Value::Nested(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Assignment, Value::Assignment) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Date(millis) => write!(f, "{}", millis),
            Value::Collection(items) | Value::Nested(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
            Value::Assignment => write!(f, "<assignment>"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Collection(items)
    }
}
