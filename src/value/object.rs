//! Property capabilities exposed by host objects.
//!
//! Objects reach the engine as `Value::Object`. Whether an object can be read
//! or written is discovered at call time through `as_resolvable` and
//! `as_changeable`, so `get`/`set` can degrade to a diagnostic instead of
//! failing the surrounding expression.

use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// Errors raised by a `Changeable` object
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("Insufficient privilege to modify property '{name}'")]
    InsufficientPrivilege { name: String },

    #[error("Unknown property '{name}'")]
    UnknownProperty { name: String },

    #[error("Property error: {0}")]
    Other(String),
}

/// Host object carried inside a `Value`
pub trait ObjectValue: Send + Sync + fmt::Debug {
    /// Name used in diagnostics
    fn type_name(&self) -> &str;

    fn as_resolvable(&self) -> Option<&dyn Resolvable> {
        None
    }

    fn as_changeable(&self) -> Option<&dyn Changeable> {
        None
    }
}

/// Read access to named properties
pub trait Resolvable {
    /// Returns `None` when the property does not exist
    fn get(&self, name: &str) -> Option<Value>;
}

/// Write access to named properties
///
/// Objects are shared, so implementations use interior mutability.
pub trait Changeable {
    fn set_property(&self, name: &str, value: Value) -> Result<(), PropertyError>;
}
