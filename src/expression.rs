//! Expression plumbing shared by every function.
//!
//! This module provides:
//! - Operator codes and arity bounds
//! - The `Operand` seam through which functions evaluate their arguments
//! - The request-scoped evaluation context and its resolver layering
//! - The filter-fragment accumulator used in filter-generation mode
//! - The error taxonomy for registration and evaluation

pub mod context;
pub mod error;
pub mod filter;
pub mod operand;
pub mod operator;

pub use context::{
    EvalContext, ExpressionParser, LayeredResolver, MapResolver, NestedGuard, Resolver,
    ScopeGuard,
};
pub use error::{ExpressionError, ExpressionResult, RegistrationError, RegistrationResult};
pub use filter::{Filter, FilterFragment, FilterTerm, FragmentGenerator};
pub use operand::{Call, Literal, Operand, OperandRef, PropertyPath};
pub use operator::{Arity, OperatorCode};
