//! Comparison and extended comparison operators.

use crate::expression::{
    Arity, EvalContext, ExpressionError, ExpressionResult, Filter, FilterFragment, OperandRef,
    OperatorCode,
};
use crate::function::{operand, BackendTarget, Function, FunctionMode};
use crate::value::{assert_compatible, coerce, Value, ValueType};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// Evaluate both operands, left first
fn evaluate_pair(
    ctx: &mut EvalContext,
    operands: &[OperandRef],
) -> ExpressionResult<(Value, Value)> {
    let left = operand(operands, 0)?.evaluate(ctx, ValueType::Any)?;
    let right = operand(operands, 1)?.evaluate(ctx, ValueType::Any)?;
    Ok((left, right))
}

/// Emit `left <op> right` as a predicate fragment
fn predicate_filter(
    op: OperatorCode,
    ctx: &mut EvalContext,
    operands: &[OperandRef],
    filter: &mut Filter,
) -> ExpressionResult<()> {
    let left = operand(operands, 0)?.filter_term(ctx)?;
    let right = operand(operands, 1)?.filter_term(ctx)?;
    filter.add_fragment(FilterFragment::Predicate {
        operator: op,
        left,
        right,
    });
    Ok(())
}

/// EQUAL, UNEQUAL and the four ordering comparisons
#[derive(Debug, Default)]
pub struct ComparisonFunction;

impl ComparisonFunction {
    fn compare(op: OperatorCode, left: &Value, right: &Value) -> ExpressionResult<bool> {
        match op {
            OperatorCode::Equal => return Ok(coerce::values_equal(left, right)),
            OperatorCode::Unequal => return Ok(!coerce::values_equal(left, right)),
            _ => {}
        }

        // Null has no order
        if left.is_null() || right.is_null() {
            return Ok(false);
        }
        let ordering = coerce::compare_values(left, right).ok_or_else(|| {
            ExpressionError::evaluation(format!(
                "cannot compare {} with {} using {}",
                left.value_type(),
                right.value_type(),
                op
            ))
        })?;
        Ok(match op {
            OperatorCode::Smaller => ordering == Ordering::Less,
            OperatorCode::SmallerOrEqual => ordering != Ordering::Greater,
            OperatorCode::Greater => ordering == Ordering::Greater,
            OperatorCode::GreaterOrEqual => ordering != Ordering::Less,
            other => {
                return Err(ExpressionError::NotImplemented {
                    function: "comparison".to_string(),
                    operator: other,
                })
            }
        })
    }
}

impl Function for ComparisonFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[
            OperatorCode::Equal,
            OperatorCode::Unequal,
            OperatorCode::Smaller,
            OperatorCode::SmallerOrEqual,
            OperatorCode::Greater,
            OperatorCode::GreaterOrEqual,
        ]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Boolean
    }

    fn mode(&self) -> FunctionMode {
        FunctionMode::Both
    }

    fn evaluate(
        &self,
        op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Boolean, expected)?;
        let (left, right) = evaluate_pair(ctx, operands)?;
        Ok(Value::Boolean(Self::compare(op, &left, &right)?))
    }

    fn generate_filter(
        &self,
        op: OperatorCode,
        ctx: &mut EvalContext,
        _target: &BackendTarget,
        operands: &[OperandRef],
        expected: ValueType,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        assert_compatible(ValueType::Boolean, expected)?;
        predicate_filter(op, ctx, operands, filter)
    }
}

/// CONTAINS_ONE_OF, CONTAINS_NONE, CONTAINS_ALL and LIKE
#[derive(Debug, Default)]
pub struct ExtendedComparisonFunction;

impl ExtendedComparisonFunction {
    fn shares_any(left: &[Value], right: &[Value]) -> bool {
        right
            .iter()
            .any(|r| left.iter().any(|l| coerce::values_equal(l, r)))
    }

    fn contains_all(left: &[Value], right: &[Value]) -> bool {
        right
            .iter()
            .all(|r| left.iter().any(|l| coerce::values_equal(l, r)))
    }

    fn like(left: &Value, pattern: &str) -> ExpressionResult<bool> {
        let regex = like_regex(pattern)?;
        Ok(match left {
            Value::Null => false,
            Value::Nested(items) => any_leaf_matches(items, &regex),
            other => regex.is_match(&coerce::to_string(other)),
        })
    }
}

impl Function for ExtendedComparisonFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[
            OperatorCode::ContainsOneOf,
            OperatorCode::ContainsNone,
            OperatorCode::ContainsAll,
            OperatorCode::Like,
        ]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Boolean
    }

    fn mode(&self) -> FunctionMode {
        FunctionMode::Both
    }

    fn evaluate(
        &self,
        op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Boolean, expected)?;
        let (left, right) = evaluate_pair(ctx, operands)?;

        if op == OperatorCode::Like {
            let pattern = coerce::to_string(&right);
            return Ok(Value::Boolean(Self::like(&left, &pattern)?));
        }

        let left = coerce::to_collection(&left).unwrap_or_default();
        let right = coerce::to_collection(&right).unwrap_or_default();
        let result = match op {
            OperatorCode::ContainsOneOf => Self::shares_any(&left, &right),
            OperatorCode::ContainsNone => !Self::shares_any(&left, &right),
            OperatorCode::ContainsAll => Self::contains_all(&left, &right),
            other => {
                return Err(ExpressionError::NotImplemented {
                    function: self.label(),
                    operator: other,
                })
            }
        };
        Ok(Value::Boolean(result))
    }

    fn generate_filter(
        &self,
        op: OperatorCode,
        ctx: &mut EvalContext,
        _target: &BackendTarget,
        operands: &[OperandRef],
        expected: ValueType,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        assert_compatible(ValueType::Boolean, expected)?;
        predicate_filter(op, ctx, operands, filter)
    }
}

/// Translate a SQL LIKE pattern into a case-insensitive whole-string regex
///
/// `%` matches any run of characters and `_` exactly one. Every other
/// character, backslash included, matches itself.
pub fn like_regex(pattern: &str) -> ExpressionResult<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("^(?:");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            _ => source.push_str(&regex::escape(&c.to_string())),
        }
    }
    source.push_str(")$");

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| {
            ExpressionError::evaluation_caused_by(format!("invalid LIKE pattern '{}'", pattern), e)
        })
}

fn any_leaf_matches(items: &[Value], regex: &Regex) -> bool {
    items.iter().any(|item| match item {
        Value::Null => false,
        Value::Collection(inner) | Value::Nested(inner) => any_leaf_matches(inner, regex),
        leaf => regex.is_match(&coerce::to_string(leaf)),
    })
}
