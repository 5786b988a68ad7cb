//! Type-safe coercion, equality and ordering rules shared by all functions.

use crate::value::Value;
use std::cmp::Ordering;

/// A value classified for numeric promotion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integral(i64),
    Floating(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integral(i) => i as f64,
            Number::Floating(x) => x,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Number::Integral(i) => Value::Integer(i),
            Number::Floating(x) => Value::Float(x),
        }
    }
}

/// Coerce to a boolean; anything that is not a boolean is `false`
pub fn to_boolean(value: &Value) -> bool {
    matches!(value, Value::Boolean(true))
}

/// Coerce to a string; null becomes the empty string
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce to a collection
///
/// Null yields `None`. Maps yield their values in key order, scalars a
/// single-element collection.
pub fn to_collection(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Null => None,
        Value::Collection(items) | Value::Nested(items) => Some(items.clone()),
        Value::Map(entries) => Some(entries.values().cloned().collect()),
        other => Some(vec![other.clone()]),
    }
}

/// Classify a value as a number, parsing strings when they hold one
pub fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Integer(i) => Some(Number::Integral(*i)),
        Value::Float(x) => Some(Number::Floating(*x)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Some(Number::Integral(i))
            } else {
                trimmed.parse::<f64>().ok().map(Number::Floating)
            }
        }
        _ => None,
    }
}

/// Coerce to a 64-bit integer, truncating floats
pub fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Date(millis) => Some(*millis),
        other => match to_number(other)? {
            Number::Integral(i) => Some(i),
            Number::Floating(x) if x.is_finite() => Some(x.trunc() as i64),
            Number::Floating(_) => None,
        },
    }
}

/// Null, the empty string and empty collections are empty
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Collection(items) | Value::Nested(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        _ => false,
    }
}

/// Type-safe equality
///
/// Numbers compare numerically whatever their representation, null equals
/// only null, and values of unrelated types are never equal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            compare_numbers(left, right) == Some(Ordering::Equal)
        }
        (Value::Collection(a) | Value::Nested(a), Value::Collection(b) | Value::Nested(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, va), (kb, vb))| ka == kb && values_equal(va, vb))
        }
        _ => left == right,
    }
}

/// Type-safe ordering
///
/// Returns `None` when the two values have no ordering relation.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            compare_numbers(left, right)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_numbers(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Integer(a), Value::Float(b)) => compare_integer_float(*a, *b),
        (Value::Float(a), Value::Integer(b)) => compare_integer_float(*b, *a).map(Ordering::reverse),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        _ => None,
    }
}

/// Exact comparison of an integer against a float
///
/// Integral floats inside the `i64` range compare as integers, so values
/// beyond 2^53 are not rounded together.
fn compare_integer_float(int: i64, float: f64) -> Option<Ordering> {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return None;
    }
    if float.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&float) {
        return Some(int.cmp(&(float as i64)));
    }
    (int as f64).partial_cmp(&float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_to_boolean_defaults_false() {
        assert!(to_boolean(&Value::Boolean(true)));
        assert!(!to_boolean(&Value::Boolean(false)));
        assert!(!to_boolean(&Value::Null));
        assert!(!to_boolean(&Value::string("true")));
        assert!(!to_boolean(&Value::Integer(1)));
    }

    #[test]
    fn test_to_number_classification() {
        assert_eq!(to_number(&Value::Integer(3)), Some(Number::Integral(3)));
        assert_eq!(to_number(&Value::Float(3.5)), Some(Number::Floating(3.5)));
        assert_eq!(to_number(&Value::string(" 7 ")), Some(Number::Integral(7)));
        assert_eq!(to_number(&Value::string("7.5")), Some(Number::Floating(7.5)));
        assert_eq!(to_number(&Value::string("seven")), None);
        assert_eq!(to_number(&Value::Boolean(true)), None);
    }

    #[test]
    fn test_to_collection() {
        assert_eq!(to_collection(&Value::Null), None);
        assert_eq!(
            to_collection(&Value::Integer(1)),
            Some(vec![Value::Integer(1)])
        );

        let mut entries = BTreeMap::new();
        entries.insert("b".to_string(), Value::Integer(2));
        entries.insert("a".to_string(), Value::Integer(1));
        assert_eq!(
            to_collection(&Value::Map(entries)),
            Some(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        assert!(values_equal(&Value::Integer(2), &Value::Float(2.0)));
        assert!(!values_equal(&Value::Integer(2), &Value::string("2")));
        assert!(values_equal(&Value::Null, &Value::Null));
        assert!(!values_equal(&Value::Null, &Value::Integer(0)));
        assert!(values_equal(
            &Value::list([1, 2]),
            &Value::Collection(vec![Value::Float(1.0), Value::Integer(2)])
        ));
    }

    #[test]
    fn test_mixed_numbers_compare_exactly() {
        let big = Value::Integer(9_007_199_254_740_993);
        let rounded = Value::Float(9_007_199_254_740_992.0);
        assert!(!values_equal(&big, &rounded));
        assert!(!values_equal(&rounded, &big));
        assert_eq!(compare_values(&big, &rounded), Some(Ordering::Greater));
        assert_eq!(compare_values(&rounded, &big), Some(Ordering::Less));
        assert!(values_equal(
            &Value::Integer(9_007_199_254_740_992),
            &Value::Float(9_007_199_254_740_992.0)
        ));
        assert_eq!(
            compare_values(&Value::Integer(i64::MAX), &Value::Float(1e19)),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&Value::Integer(1), &Value::Float(f64::NAN)), None);
    }

    #[test]
    fn test_ordering() {
        assert_eq!(
            compare_values(&Value::Integer(1), &Value::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::string("b"), &Value::string("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&Value::string("1"), &Value::Integer(1)), None);
        assert_eq!(compare_values(&Value::Null, &Value::Null), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&Value::string("")));
        assert!(is_empty(&Value::Collection(vec![])));
        assert!(is_empty(&Value::Map(BTreeMap::new())));
        assert!(!is_empty(&Value::string("x")));
        assert!(!is_empty(&Value::Integer(0)));
    }
}
