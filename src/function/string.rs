//! String functions.

use crate::expression::{Arity, EvalContext, ExpressionResult, OperandRef, OperatorCode};
use crate::function::Function;
use crate::value::{assert_compatible, coerce, Value, ValueType};

/// `concat(a, b, ...)`: every operand, in order, as one string
#[derive(Debug, Default)]
pub struct ConcatFunction;

impl Function for ConcatFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2)
    }

    fn name(&self) -> Option<&str> {
        Some("concat")
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::String
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::String, expected)?;
        let mut result = String::new();
        for operand in operands {
            let value = operand.evaluate(ctx, ValueType::Any)?;
            result.push_str(&coerce::to_string(&value));
        }
        Ok(Value::String(result))
    }
}
