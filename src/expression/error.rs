//! Error types for function registration and expression evaluation.

use crate::expression::{Arity, OperatorCode};
use crate::function::BackendTarget;
use crate::value::ValueType;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while evaluating expressions or generating filters
#[derive(Error, Debug)]
pub enum ExpressionError {
    /// Produced type disagrees with the caller's expected type
    #[error("Type mismatch: produced {produced}, expected {expected}")]
    TypeMismatch {
        produced: ValueType,
        expected: ValueType,
    },

    /// Operand evaluation failure, arithmetic fault, bad index, nested
    /// expression failure
    #[error("Expression evaluation error: {message}")]
    Evaluation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Function has no evaluation behavior for this operator
    #[error("Function {function} does not evaluate operator {operator}")]
    NotImplemented {
        function: String,
        operator: OperatorCode,
    },

    /// Function only supports evaluation mode
    #[error("Function {function} cannot generate a filter for operator {operator}")]
    FilterGenerationNotImplemented {
        function: String,
        operator: OperatorCode,
    },

    /// No implementation registered for the operator in the relevant store
    #[error("No function bound to operator {operator} for backend {backend}")]
    UnboundOperator {
        operator: OperatorCode,
        backend: BackendTarget,
    },

    /// No named function registered under this name
    #[error("Unknown function: {name} for backend {backend}")]
    UnknownFunction { name: String, backend: BackendTarget },

    /// Operand count outside the function's arity
    #[error("Function {function} expects {arity} arguments, got {actual}")]
    ArityMismatch {
        function: String,
        arity: Arity,
        actual: usize,
    },

    /// Nested `eval` went deeper than the configured limit
    #[error("Nested expression depth limit of {limit} exceeded")]
    RecursionLimit { limit: usize },

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl ExpressionError {
    pub fn evaluation(message: impl Into<String>) -> Self {
        ExpressionError::Evaluation {
            message: message.into(),
            source: None,
        }
    }

    pub fn evaluation_caused_by(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        ExpressionError::Evaluation {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn is_evaluation(&self) -> bool {
        matches!(self, ExpressionError::Evaluation { .. })
    }
}

/// Errors that can occur while registering a function implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("No implementation found for identifier '{identifier}'")]
    NotFound { identifier: String },

    #[error("Identifier '{identifier}' does not name a function")]
    NotAFunction { identifier: String },

    #[error("Failed to instantiate '{identifier}': {reason}")]
    Instantiation { identifier: String, reason: String },

    #[error("Function '{identifier}' declares no supported backends")]
    NoBackends { identifier: String },

    #[error("Unrecognized backend: {backend}")]
    UnknownBackend { backend: BackendTarget },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Result type for registration operations
pub type RegistrationResult<T> = Result<T, RegistrationError>;
