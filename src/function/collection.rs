//! Collection functions: `fromArray`, `insert`, `isempty`.

use crate::expression::{
    Arity, EvalContext, ExpressionError, ExpressionResult, OperandRef, OperatorCode,
};
use crate::function::{operand, Function};
use crate::value::{assert_compatible, coerce, Value, ValueType};

/// `fromArray(collection, index)`
#[derive(Debug, Default)]
pub struct FromArrayFunction;

impl FromArrayFunction {
    /// Element at `index`; maps have no random access and are scanned
    fn element_at(collection: Value, index: usize) -> Option<Value> {
        match collection {
            Value::Collection(mut items) | Value::Nested(mut items) => {
                (index < items.len()).then(|| items.swap_remove(index))
            }
            Value::Map(entries) => entries.into_values().nth(index),
            scalar => (index == 0).then_some(scalar),
        }
    }
}

impl Function for FromArrayFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn name(&self) -> Option<&str> {
        Some("fromArray")
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Any
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        _expected: ValueType,
    ) -> ExpressionResult<Value> {
        let collection = operand(operands, 0)?.evaluate(ctx, ValueType::Any)?;
        if collection.is_null() {
            return Ok(Value::Null);
        }
        let index_value = operand(operands, 1)?.evaluate(ctx, ValueType::Number)?;
        let index = coerce::to_integer(&index_value).ok_or_else(|| {
            ExpressionError::evaluation(format!("fromArray index '{}' is not an integer", index_value))
        })?;

        let out_of_bounds = || {
            ExpressionError::evaluation(format!("fromArray index {} is out of bounds", index))
        };
        let index = usize::try_from(index).map_err(|_| out_of_bounds())?;
        Self::element_at(collection, index).ok_or_else(out_of_bounds)
    }
}

/// `insert(collection, value[, index[, unique]])`: a copy of `collection`
/// with `value` inserted
#[derive(Debug, Default)]
pub struct InsertFunction;

impl Function for InsertFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::between(2, 4)
    }

    fn name(&self) -> Option<&str> {
        Some("insert")
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Collection
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Collection, expected)?;
        let source = operand(operands, 0)?.evaluate(ctx, ValueType::Any)?;
        let mut items = coerce::to_collection(&source).unwrap_or_default();

        let value = operand(operands, 1)?.evaluate(ctx, ValueType::Any)?;
        if value.is_null() {
            return Ok(Value::Collection(items));
        }

        // Negative or missing index appends
        let index = match operands.get(2) {
            Some(position) => {
                let position = position.evaluate(ctx, ValueType::Number)?;
                match position {
                    Value::Null => None,
                    other => {
                        let i = coerce::to_integer(&other).ok_or_else(|| {
                            ExpressionError::evaluation(format!(
                                "insert index '{}' is not an integer",
                                other
                            ))
                        })?;
                        usize::try_from(i).ok()
                    }
                }
            }
            None => None,
        };
        let unique = match operands.get(3) {
            Some(flag) => coerce::to_boolean(&flag.evaluate(ctx, ValueType::Boolean)?),
            None => false,
        };

        if unique {
            items.retain(|existing| {
                !(coerce::values_equal(existing, &value) || coerce::values_equal(&value, existing))
            });
        }
        let at = index.map_or(items.len(), |i| i.min(items.len()));
        items.insert(at, value);
        Ok(Value::Collection(items))
    }
}

/// `isempty(value)`: true for null, the empty string and empty collections
#[derive(Debug, Default)]
pub struct IsEmptyFunction;

impl Function for IsEmptyFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(1)
    }

    fn name(&self) -> Option<&str> {
        Some("isempty")
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
        let value = operand(operands, 0)?.evaluate(ctx, ValueType::Any)?;
        Ok(Value::Boolean(coerce::is_empty(&value)))
    }
}
