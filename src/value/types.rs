//! Semantic value types and the produced/expected compatibility contract.

use crate::expression::{ExpressionError, ExpressionResult};
use std::fmt;

/// Semantic result types a function can produce or a caller can expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Any,
    Boolean,
    Number,
    String,
    Date,
    Collection,
    Null,
    Assignment,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Date => "date",
            ValueType::Collection => "collection",
            ValueType::Null => "null",
            ValueType::Assignment => "assignment",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that a function producing `produced` may serve a caller expecting
/// `expected`.
///
/// `Any` accepts everything; otherwise the types must match exactly.
pub fn assert_compatible(produced: ValueType, expected: ValueType) -> ExpressionResult<()> {
    if expected == ValueType::Any || produced == expected {
        Ok(())
    } else {
        Err(ExpressionError::TypeMismatch { produced, expected })
    }
}
