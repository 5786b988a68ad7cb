//! Arithmetic operators.
//!
//! Numeric promotion: when both operands are integral the operation runs in
//! 64-bit integer arithmetic and yields an integer; otherwise both are widened
//! to `f64`. Integer faults (division by zero, overflow) surface as evaluation
//! errors; float operations follow IEEE semantics and never fault.

use crate::expression::{
    Arity, EvalContext, ExpressionError, ExpressionResult, OperandRef, OperatorCode,
};
use crate::function::{operand, Function};
use crate::value::coerce::{self, Number};
use crate::value::{assert_compatible, Value, ValueType};
use thiserror::Error;

/// Integer arithmetic faults, wrapped as the source of an evaluation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArithmeticFault {
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}

fn evaluate_number(
    ctx: &mut EvalContext,
    operand: &OperandRef,
    op: OperatorCode,
) -> ExpressionResult<Number> {
    let value = operand.evaluate(ctx, ValueType::Number)?;
    if value.is_null() {
        return Err(ExpressionError::evaluation(format!(
            "null operand for operator {}",
            op
        )));
    }
    coerce::to_number(&value).ok_or_else(|| {
        ExpressionError::evaluation(format!(
            "operand '{}' of operator {} is not a number",
            value, op
        ))
    })
}

fn fault(op: OperatorCode, fault: ArithmeticFault) -> ExpressionError {
    ExpressionError::evaluation_caused_by(format!("operator {} failed", op), fault)
}

fn integer_op(op: OperatorCode, a: i64, b: i64) -> ExpressionResult<i64> {
    let result = match op {
        OperatorCode::Add => a.checked_add(b),
        OperatorCode::Sub => a.checked_sub(b),
        OperatorCode::Mult => a.checked_mul(b),
        OperatorCode::Div | OperatorCode::Mod if b == 0 => {
            return Err(fault(op, ArithmeticFault::DivisionByZero))
        }
        OperatorCode::Div => a.checked_div(b),
        OperatorCode::Mod => a.checked_rem(b),
        other => {
            return Err(ExpressionError::NotImplemented {
                function: "arithmetic".to_string(),
                operator: other,
            })
        }
    };
    result.ok_or_else(|| fault(op, ArithmeticFault::Overflow))
}

fn float_op(op: OperatorCode, a: f64, b: f64) -> ExpressionResult<f64> {
    Ok(match op {
        OperatorCode::Add => a + b,
        OperatorCode::Sub => a - b,
        OperatorCode::Mult => a * b,
        OperatorCode::Div => a / b,
        OperatorCode::Mod => a % b,
        other => {
            return Err(ExpressionError::NotImplemented {
                function: "arithmetic".to_string(),
                operator: other,
            })
        }
    })
}

/// Binary ADD, SUB, MULT, DIV and MOD
#[derive(Debug, Default)]
pub struct ArithmeticFunction;

impl Function for ArithmeticFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[
            OperatorCode::Add,
            OperatorCode::Sub,
            OperatorCode::Mult,
            OperatorCode::Div,
            OperatorCode::Mod,
        ]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Number
    }

    fn evaluate(
        &self,
        op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Number, expected)?;
        let left = evaluate_number(ctx, operand(operands, 0)?, op)?;
        let right = evaluate_number(ctx, operand(operands, 1)?, op)?;

        match (left, right) {
            (Number::Integral(a), Number::Integral(b)) => Ok(Value::Integer(integer_op(op, a, b)?)),
            (a, b) => Ok(Value::Float(float_op(op, a.as_f64(), b.as_f64())?)),
        }
    }
}

/// Unary PLUS and MINUS, preserving the operand's integral classification
#[derive(Debug, Default)]
pub struct UnaryArithmeticFunction;

impl Function for UnaryArithmeticFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::UnaryPlus, OperatorCode::UnaryMinus]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(1)
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Number
    }

    fn evaluate(
        &self,
        op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Number, expected)?;
        let number = evaluate_number(ctx, operand(operands, 0)?, op)?;
        if op == OperatorCode::UnaryPlus {
            return Ok(number.into_value());
        }
        match number {
            Number::Integral(i) => i
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| fault(op, ArithmeticFault::Overflow)),
            Number::Floating(x) => Ok(Value::Float(-x)),
        }
    }
}
