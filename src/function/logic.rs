//! Boolean operators.
//!
//! AND and OR short-circuit: the right operand is only evaluated when the
//! left one does not decide the result. Operand evaluation may have side
//! effects, and expressions rely on the right-hand side being skipped.

use crate::expression::{
    Arity, EvalContext, ExpressionResult, Filter, FilterFragment, OperandRef, OperatorCode,
};
use crate::function::{operand, BackendTarget, Function, FunctionMode};
use crate::value::{assert_compatible, coerce, Value, ValueType};

fn evaluate_boolean(ctx: &mut EvalContext, operand: &OperandRef) -> ExpressionResult<bool> {
    let value = operand.evaluate(ctx, ValueType::Boolean)?;
    Ok(coerce::to_boolean(&value))
}

/// Logical AND, evaluation only
#[derive(Debug, Default)]
pub struct AndFunction;

impl Function for AndFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::And]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Boolean
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Boolean, expected)?;
        if !evaluate_boolean(ctx, operand(operands, 0)?)? {
            return Ok(Value::Boolean(false));
        }
        Ok(Value::Boolean(evaluate_boolean(ctx, operand(operands, 1)?)?))
    }
}

/// Logical OR, evaluation only
#[derive(Debug, Default)]
pub struct OrFunction;

impl Function for OrFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::Or]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Boolean
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Boolean, expected)?;
        if evaluate_boolean(ctx, operand(operands, 0)?)? {
            return Ok(Value::Boolean(true));
        }
        Ok(Value::Boolean(evaluate_boolean(ctx, operand(operands, 1)?)?))
    }
}

/// Logical NOT
///
/// In filter mode the operand's fragments are wrapped in a negation.
#[derive(Debug, Default)]
pub struct NotFunction;

impl Function for NotFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::Not]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(1)
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Boolean
    }

    fn mode(&self) -> FunctionMode {
        FunctionMode::Both
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Boolean, expected)?;
        Ok(Value::Boolean(!evaluate_boolean(ctx, operand(operands, 0)?)?))
    }

    fn generate_filter(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        target: &BackendTarget,
        operands: &[OperandRef],
        expected: ValueType,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        assert_compatible(ValueType::Boolean, expected)?;
        let mut negated = Filter::new();
        operand(operands, 0)?.generate_filter(ctx, target, &mut negated)?;
        filter.add_fragment(FilterFragment::Not(negated));
        Ok(())
    }
}
