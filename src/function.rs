//! Function capability and built-in implementations.
//!
//! Every operator and named function implements [`Function`]. A function
//! receives its operands unevaluated and decides which to evaluate and in
//! what order, so short-circuiting and side effects stay under its control.
//!
//! Function instances are shared by every request once registered; they hold
//! no per-call state. Request state lives in [`EvalContext`].

pub mod arithmetic;
pub mod collection;
pub mod comparison;
pub mod control;
pub mod logic;
pub mod property;
pub mod string;

pub use arithmetic::{ArithmeticFunction, UnaryArithmeticFunction};
pub use collection::{FromArrayFunction, InsertFunction, IsEmptyFunction};
pub use comparison::{ComparisonFunction, ExtendedComparisonFunction};
pub use control::{DoFunction, EchoFunction, EvalFunction, ForeachFunction, IfFunction};
pub use logic::{AndFunction, NotFunction, OrFunction};
pub use property::{GetFunction, SetFunction};
pub use string::ConcatFunction;

use crate::expression::{
    Arity, EvalContext, ExpressionError, ExpressionResult, Filter, OperandRef, OperatorCode,
};
use crate::value::{Value, ValueType};
use std::fmt;

/// Backend kind every built-in query function registers with
pub const DEFAULT_QUERY_BACKEND: &str = "query";

/// Evaluation target a function can be registered for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendTarget {
    /// Direct value evaluation against a resolution context
    Direct,
    /// Filter generation for the named query backend kind
    Query(String),
}

impl BackendTarget {
    pub fn query(kind: impl Into<String>) -> Self {
        BackendTarget::Query(kind.into())
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, BackendTarget::Direct)
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendTarget::Direct => write!(f, "direct"),
            BackendTarget::Query(kind) => write!(f, "query:{}", kind),
        }
    }
}

/// Which of the two dispatch modes a function implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionMode {
    EvaluateOnly,
    FilterOnly,
    Both,
}

impl FunctionMode {
    pub fn can_evaluate(self) -> bool {
        matches!(self, FunctionMode::EvaluateOnly | FunctionMode::Both)
    }

    pub fn can_generate_filter(self) -> bool {
        matches!(self, FunctionMode::FilterOnly | FunctionMode::Both)
    }
}

/// Trait for all operator and named-function implementations
pub trait Function: Send + Sync + fmt::Debug {
    /// Operator codes this function implements. A pure named function
    /// returns exactly `[OperatorCode::NamedFunction]`.
    fn supported_operators(&self) -> &[OperatorCode];

    /// Backends this function registers with; must not be empty
    fn supported_backends(&self) -> Vec<BackendTarget> {
        standard_backends()
    }

    fn arity(&self) -> Arity;

    /// Required whenever `NamedFunction` is among the supported operators
    fn name(&self) -> Option<&str> {
        None
    }

    fn expected_result_type(&self, op: OperatorCode) -> ValueType;

    /// Whether a call may be constant-folded when all operands are constant
    fn supports_static_evaluation(&self) -> bool {
        true
    }

    fn mode(&self) -> FunctionMode {
        FunctionMode::EvaluateOnly
    }

    fn evaluate(
        &self,
        op: OperatorCode,
        _ctx: &mut EvalContext,
        _operands: &[OperandRef],
        _expected: ValueType,
    ) -> ExpressionResult<Value> {
        Err(ExpressionError::NotImplemented {
            function: self.label(),
            operator: op,
        })
    }

    /// Append this call's filter fragments to `filter`
    fn generate_filter(
        &self,
        op: OperatorCode,
        _ctx: &mut EvalContext,
        _target: &BackendTarget,
        _operands: &[OperandRef],
        _expected: ValueType,
        _filter: &mut Filter,
    ) -> ExpressionResult<()> {
        Err(ExpressionError::FilterGenerationNotImplemented {
            function: self.label(),
            operator: op,
        })
    }

    /// Name used in diagnostics
    fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self
                .supported_operators()
                .iter()
                .map(OperatorCode::as_str)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

/// Direct evaluation plus the default query backend
pub fn standard_backends() -> Vec<BackendTarget> {
    vec![
        BackendTarget::Direct,
        BackendTarget::query(DEFAULT_QUERY_BACKEND),
    ]
}

/// Fetch operand `index`, failing instead of panicking when a caller skipped
/// arity validation
pub(crate) fn operand(operands: &[OperandRef], index: usize) -> ExpressionResult<&OperandRef> {
    operands.get(index).ok_or_else(|| {
        ExpressionError::evaluation(format!(
            "missing operand {} (got {} operands)",
            index,
            operands.len()
        ))
    })
}
