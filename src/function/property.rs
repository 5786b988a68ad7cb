//! Property access on host objects: `get` and `set`.
//!
//! Missing capabilities and privilege failures are logged and absorbed so a
//! single inaccessible property does not abort the surrounding expression.

use crate::expression::{
    Arity, EvalContext, ExpressionError, ExpressionResult, OperandRef, OperatorCode,
};
use crate::function::{operand, Function};
use crate::value::{assert_compatible, coerce, PropertyError, Value, ValueType};

fn attribute_name(ctx: &mut EvalContext, operands: &[OperandRef]) -> ExpressionResult<String> {
    let name = operand(operands, 1)?.evaluate(ctx, ValueType::String)?;
    Ok(coerce::to_string(&name))
}

/// `get(object, attribute)`
#[derive(Debug, Default)]
pub struct GetFunction;

impl Function for GetFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn name(&self) -> Option<&str> {
        Some("get")
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
        let target = operand(operands, 0)?.evaluate(ctx, ValueType::Any)?;
        let name = attribute_name(ctx, operands)?;

        let resolvable = match &target {
            Value::Object(obj) => obj.as_resolvable(),
            _ => None,
        };
        match resolvable {
            Some(resolvable) => Ok(resolvable.get(&name).unwrap_or(Value::Null)),
            None => {
                log::warn!(
                    "get: {} value '{}' has no readable properties (requested '{}')",
                    target.value_type(),
                    target,
                    name
                );
                Ok(Value::Null)
            }
        }
    }
}

/// `set(object, attribute, value)`
#[derive(Debug, Default)]
pub struct SetFunction;

impl Function for SetFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(3)
    }

    fn name(&self) -> Option<&str> {
        Some("set")
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Assignment
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        assert_compatible(ValueType::Assignment, expected)?;
        let target = operand(operands, 0)?.evaluate(ctx, ValueType::Any)?;
        let name = attribute_name(ctx, operands)?;
        let value = operand(operands, 2)?.evaluate(ctx, ValueType::Any)?;

        let changeable = match &target {
            Value::Object(obj) => obj.as_changeable(),
            _ => None,
        };
        let Some(changeable) = changeable else {
            log::warn!(
                "set: {} value '{}' has no writable properties (attribute '{}')",
                target.value_type(),
                target,
                name
            );
            return Ok(Value::Assignment);
        };

        match changeable.set_property(&name, value) {
            Ok(()) => Ok(Value::Assignment),
            Err(err @ PropertyError::InsufficientPrivilege { .. }) => {
                log::warn!("set: {}", err);
                Ok(Value::Assignment)
            }
            Err(err) => Err(ExpressionError::evaluation_caused_by(
                format!("set of '{}' failed", name),
                err,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Literal, MapResolver, PropertyPath};
    use crate::registry::{Registry, RegistryConfig};
    use crate::value::{Changeable, ObjectValue, Resolvable};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Node with a read-only `id` and writable string properties
    #[derive(Debug, Default)]
    struct Node {
        properties: Mutex<HashMap<String, Value>>,
    }

    impl ObjectValue for Node {
        fn type_name(&self) -> &str {
            "node"
        }

        fn as_resolvable(&self) -> Option<&dyn Resolvable> {
            Some(self)
        }

        fn as_changeable(&self) -> Option<&dyn Changeable> {
            Some(self)
        }
    }

    impl Resolvable for Node {
        fn get(&self, name: &str) -> Option<Value> {
            if name == "id" {
                return Some(Value::Integer(7));
            }
            self.properties.lock().get(name).cloned()
        }
    }

    impl Changeable for Node {
        fn set_property(&self, name: &str, value: Value) -> Result<(), PropertyError> {
            match (name, &value) {
                ("id", _) => Err(PropertyError::InsufficientPrivilege {
                    name: name.to_string(),
                }),
                (_, Value::String(_)) => {
                    self.properties.lock().insert(name.to_string(), value);
                    Ok(())
                }
                _ => Err(PropertyError::Other(format!("{} only accepts strings", name))),
            }
        }
    }

    fn context(node: Value) -> EvalContext {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));
        EvalContext::new(registry, Arc::new(MapResolver::new().with("node", node)))
    }

    fn call(f: &dyn Function, ctx: &mut EvalContext, operands: Vec<OperandRef>) -> ExpressionResult<Value> {
        f.evaluate(OperatorCode::NamedFunction, ctx, &operands, ValueType::Any)
    }

    #[test]
    fn test_get_and_set() {
        let mut ctx = context(Value::object(Node::default()));
        let node = PropertyPath::operand("node");

        assert_eq!(
            call(&GetFunction, &mut ctx, vec![Arc::clone(&node), Literal::operand("id")]).unwrap(),
            Value::Integer(7)
        );
        assert_eq!(
            call(&GetFunction, &mut ctx, vec![Arc::clone(&node), Literal::operand("title")]).unwrap(),
            Value::Null
        );
        assert_eq!(
            call(
                &SetFunction,
                &mut ctx,
                vec![Arc::clone(&node), Literal::operand("title"), Literal::operand("Home")]
            )
            .unwrap(),
            Value::Assignment
        );
        assert_eq!(
            call(&GetFunction, &mut ctx, vec![node, Literal::operand("title")]).unwrap(),
            Value::string("Home")
        );
    }

    #[test]
    fn test_missing_capability_is_absorbed() {
        let mut ctx = context(Value::string("not an object"));
        let node = PropertyPath::operand("node");
        assert_eq!(
            call(&GetFunction, &mut ctx, vec![Arc::clone(&node), Literal::operand("id")]).unwrap(),
            Value::Null
        );
        assert_eq!(
            call(&SetFunction, &mut ctx, vec![node, Literal::operand("id"), Literal::operand(1)]).unwrap(),
            Value::Assignment
        );
    }

    #[test]
    fn test_privilege_failure_is_absorbed() {
        let mut ctx = context(Value::object(Node::default()));
        let result = call(
            &SetFunction,
            &mut ctx,
            vec![PropertyPath::operand("node"), Literal::operand("id"), Literal::operand("x")],
        );
        assert_eq!(result.unwrap(), Value::Assignment);
    }

    #[test]
    fn test_other_property_failures_propagate() {
        let mut ctx = context(Value::object(Node::default()));
        let err = call(
            &SetFunction,
            &mut ctx,
            vec![PropertyPath::operand("node"), Literal::operand("title"), Literal::operand(3)],
        )
        .unwrap_err();
        assert!(err.is_evaluation());
    }
}
