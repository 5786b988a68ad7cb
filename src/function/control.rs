//! Control-flow named functions: `do`, `if`, `eval`, `echo`, `foreach`.

use crate::expression::{
    Arity, EvalContext, ExpressionError, ExpressionResult, Filter, FilterFragment,
    FragmentGenerator, OperandRef, OperatorCode,
};
use crate::function::{operand, BackendTarget, Function, FunctionMode};
use crate::value::{assert_compatible, coerce, Value, ValueType};
use std::sync::Arc;

/// `do(a, b, ...)`: evaluate every operand for effect
#[derive(Debug, Default)]
pub struct DoFunction;

impl Function for DoFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1)
    }

    fn name(&self) -> Option<&str> {
        Some("do")
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
        for operand in operands {
            operand.evaluate(ctx, ValueType::Any)?;
        }
        Ok(Value::Assignment)
    }
}

/// `if(condition, then[, else])`
#[derive(Debug, Default)]
pub struct IfFunction;

impl Function for IfFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::between(2, 3)
    }

    fn name(&self) -> Option<&str> {
        Some("if")
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Any
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        let condition = operand(operands, 0)?.evaluate(ctx, ValueType::Boolean)?;
        if coerce::to_boolean(&condition) {
            operand(operands, 1)?.evaluate(ctx, expected)
        } else {
            match operands.get(2) {
                Some(otherwise) => otherwise.evaluate(ctx, expected),
                None => Ok(Value::Null),
            }
        }
    }
}

/// `eval(text)`: parse `text` as an expression and evaluate it in the
/// current context
///
/// In filter mode the nested expression is parsed only when the filter is
/// built, since its text may depend on context not yet available.
#[derive(Debug, Default)]
pub struct EvalFunction;

impl EvalFunction {
    fn parse(ctx: &EvalContext, text: &str) -> ExpressionResult<OperandRef> {
        let parser = ctx
            .parser()
            .ok_or_else(|| ExpressionError::evaluation("no expression parser configured"))?;
        parser.parse(text).map_err(|e| {
            ExpressionError::evaluation_caused_by(format!("failed to parse '{}'", text), e)
        })
    }

    fn evaluate_nested(
        ctx: &mut EvalContext,
        text: &str,
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        let nested = Self::parse(ctx, text)?;
        let mut guard = ctx.enter_nested()?;
        nested.evaluate(&mut guard, expected)
    }
}

fn nested_failure(text: &str, err: ExpressionError) -> ExpressionError {
    ExpressionError::evaluation_caused_by(
        format!("nested expression '{}' failed", text),
        err,
    )
}

impl Function for EvalFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(1)
    }

    fn name(&self) -> Option<&str> {
        Some("eval")
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Any
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
        let source = operand(operands, 0)?.evaluate(ctx, ValueType::String)?;
        let text = coerce::to_string(&source);
        if text.is_empty() {
            return Ok(Value::String(text));
        }
        Self::evaluate_nested(ctx, &text, expected).map_err(|e| nested_failure(&text, e))
    }

    fn generate_filter(
        &self,
        _op: OperatorCode,
        _ctx: &mut EvalContext,
        _target: &BackendTarget,
        operands: &[OperandRef],
        _expected: ValueType,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        let source = Arc::clone(operand(operands, 0)?);
        filter.add_fragment(FilterFragment::Deferred(Arc::new(DeferredEval { source })));
        Ok(())
    }
}

/// Re-resolves the expression text of an `eval` call at filter-build time
#[derive(Debug)]
struct DeferredEval {
    source: OperandRef,
}

impl DeferredEval {
    fn generate_nested(
        ctx: &mut EvalContext,
        text: &str,
        target: &BackendTarget,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        let nested = EvalFunction::parse(ctx, text)?;
        let mut guard = ctx.enter_nested()?;
        let mut generated = Filter::new();
        nested.generate_filter(&mut guard, target, &mut generated)?;
        // Expand while the depth is held, or a self-referencing text never
        // reaches the limit
        filter.append(generated.build(&mut guard, target)?);
        Ok(())
    }
}

impl FragmentGenerator for DeferredEval {
    fn generate(
        &self,
        ctx: &mut EvalContext,
        target: &BackendTarget,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        let text = coerce::to_string(&self.source.evaluate(ctx, ValueType::String)?);
        if text.is_empty() {
            return Ok(());
        }
        Self::generate_nested(ctx, &text, target, filter).map_err(|e| nested_failure(&text, e))
    }
}

/// `echo(value)`: log the value and pass it through
///
/// Static evaluation is left at the default even though echo logs.
#[derive(Debug, Default)]
pub struct EchoFunction;

impl Function for EchoFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(1)
    }

    fn name(&self) -> Option<&str> {
        Some("echo")
    }

    fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
        ValueType::Any
    }

    fn evaluate(
        &self,
        _op: OperatorCode,
        ctx: &mut EvalContext,
        operands: &[OperandRef],
        expected: ValueType,
    ) -> ExpressionResult<Value> {
        let value = operand(operands, 0)?.evaluate(ctx, expected)?;
        log::info!(target: "exprfn::echo", "{}", value);
        Ok(value)
    }
}

/// `foreach(source, variable, body)`: evaluate `body` once per element of
/// `source` with `variable` bound to the element, collecting the results
#[derive(Debug, Default)]
pub struct ForeachFunction;

impl Function for ForeachFunction {
    fn supported_operators(&self) -> &[OperatorCode] {
        &[OperatorCode::NamedFunction]
    }

    fn arity(&self) -> Arity {
        Arity::exactly(3)
    }

    fn name(&self) -> Option<&str> {
        Some("foreach")
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
        let items = match operand(operands, 0)?.evaluate(ctx, ValueType::Any)? {
            Value::Map(entries) => entries.into_values().collect(),
            Value::Collection(items) | Value::Nested(items) => items,
            other => {
                log::warn!(
                    "foreach: cannot iterate over {} value '{}'",
                    other.value_type(),
                    other
                );
                return Ok(Value::Collection(Vec::new()));
            }
        };

        let variable = coerce::to_string(&operand(operands, 1)?.evaluate(ctx, ValueType::String)?);
        if variable.is_empty() {
            return Err(ExpressionError::evaluation(
                "foreach requires a loop variable name",
            ));
        }

        let body = operand(operands, 2)?;
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let mut scope = ctx.push_scope(variable.as_str(), item);
            results.push(body.evaluate(&mut scope, ValueType::Any)?);
        }
        Ok(Value::Collection(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Call, Literal, MapResolver, Operand, PropertyPath};
    use crate::registry::{Registry, RegistryConfig};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Counting {
        hits: Arc<AtomicUsize>,
    }

    impl Operand for Counting {
        fn evaluate(&self, _ctx: &mut EvalContext, _expected: ValueType) -> ExpressionResult<Value> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Integer(2))
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Operand for Failing {
        fn evaluate(&self, _ctx: &mut EvalContext, _expected: ValueType) -> ExpressionResult<Value> {
            Err(ExpressionError::evaluation("boom"))
        }
    }

    /// Parser over a fixed table of expression texts
    struct TableParser {
        table: HashMap<String, OperandRef>,
    }

    impl crate::expression::ExpressionParser for TableParser {
        fn parse(
            &self,
            text: &str,
        ) -> Result<OperandRef, Box<dyn std::error::Error + Send + Sync>> {
            self.table
                .get(text)
                .cloned()
                .ok_or_else(|| format!("syntax error in '{}'", text).into())
        }
    }

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::bootstrap(
            RegistryConfig::default().with_max_eval_depth(4),
        ))
    }

    fn context(registry: &Arc<Registry>, resolver: MapResolver) -> EvalContext {
        EvalContext::new(Arc::clone(registry), Arc::new(resolver))
    }

    fn call(f: &dyn Function, ctx: &mut EvalContext, operands: &[OperandRef]) -> ExpressionResult<Value> {
        f.evaluate(OperatorCode::NamedFunction, ctx, operands, ValueType::Any)
    }

    #[test]
    fn test_do_returns_assignment() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let counting: OperandRef = Arc::new(Counting {
            hits: Arc::clone(&hits),
        });
        let operands = vec![Arc::clone(&counting), counting];
        assert_eq!(call(&DoFunction, &mut ctx, &operands).unwrap(), Value::Assignment);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        let err = DoFunction
            .evaluate(OperatorCode::NamedFunction, &mut ctx, &operands, ValueType::Boolean)
            .unwrap_err();
        assert!(matches!(err, ExpressionError::TypeMismatch { .. }));
    }

    #[test]
    fn test_if_branches() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let otherwise: OperandRef = Arc::new(Counting {
            hits: Arc::clone(&hits),
        });

        let operands = vec![Literal::operand(true), Literal::operand(1), Arc::clone(&otherwise)];
        assert_eq!(call(&IfFunction, &mut ctx, &operands).unwrap(), Value::Integer(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let operands = vec![Literal::operand(false), Literal::operand(1), otherwise];
        assert_eq!(call(&IfFunction, &mut ctx, &operands).unwrap(), Value::Integer(2));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let operands = vec![Literal::operand(false), Literal::operand(1)];
        assert_eq!(call(&IfFunction, &mut ctx, &operands).unwrap(), Value::Null);

        let operands = vec![Literal::operand("true"), Literal::operand(1)];
        assert_eq!(call(&IfFunction, &mut ctx, &operands).unwrap(), Value::Null);
    }

    #[test]
    fn test_eval_nested_expression() {
        let registry = registry();
        let sum = Call::operator(
            &registry,
            OperatorCode::Add,
            vec![PropertyPath::operand("x"), Literal::operand(1)],
        )
        .unwrap()
        .into_operand();
        let mut table = HashMap::new();
        table.insert("x + 1".to_string(), sum);
        let mut ctx = context(&registry, MapResolver::new().with("x", 41))
            .with_parser(Arc::new(TableParser { table }));

        let operands = vec![Literal::operand("x + 1")];
        assert_eq!(call(&EvalFunction, &mut ctx, &operands).unwrap(), Value::Integer(42));
        assert_eq!(ctx.depth(), 0);

        let operands = vec![Literal::operand("")];
        assert_eq!(call(&EvalFunction, &mut ctx, &operands).unwrap(), Value::string(""));

        let operands = vec![Literal::operand("x +")];
        assert!(call(&EvalFunction, &mut ctx, &operands).unwrap_err().is_evaluation());
    }

    #[test]
    fn test_eval_without_parser() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new());
        let operands = vec![Literal::operand("1")];
        assert!(call(&EvalFunction, &mut ctx, &operands).unwrap_err().is_evaluation());
    }

    #[test]
    fn test_eval_recursion_is_bounded() {
        let registry = registry();
        // "loop" parses to eval("loop")
        let looping = Call::named(&registry, "eval", vec![Literal::operand("loop")])
            .unwrap()
            .into_operand();
        let mut table = HashMap::new();
        table.insert("loop".to_string(), looping);
        let mut ctx = context(&registry, MapResolver::new())
            .with_parser(Arc::new(TableParser { table }));

        let operands = vec![Literal::operand("loop")];
        let err = call(&EvalFunction, &mut ctx, &operands).unwrap_err();
        assert!(err.is_evaluation());
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_eval_recursion_is_bounded_in_filter_mode() {
        let registry = registry();
        let looping = Call::named(&registry, "eval", vec![Literal::operand("loop")])
            .unwrap()
            .into_operand();
        let mut table = HashMap::new();
        table.insert("loop".to_string(), Arc::clone(&looping));
        let mut ctx = context(&registry, MapResolver::new())
            .with_parser(Arc::new(TableParser { table }));

        let target = BackendTarget::query("query");
        let mut filter = Filter::new();
        looping.generate_filter(&mut ctx, &target, &mut filter).unwrap();
        assert!(filter.has_deferred());

        let err = filter.build(&mut ctx, &target).unwrap_err();
        assert!(err.is_evaluation());
        let mut source = std::error::Error::source(&err);
        let mut hit_limit = false;
        while let Some(cause) = source {
            if matches!(
                cause.downcast_ref::<ExpressionError>(),
                Some(ExpressionError::RecursionLimit { limit: 4 })
            ) {
                hit_limit = true;
            }
            source = std::error::Error::source(cause);
        }
        assert!(hit_limit);
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_eval_defers_filter_generation() {
        let registry = registry();
        let condition = Call::operator(
            &registry,
            OperatorCode::Equal,
            vec![PropertyPath::operand("status"), Literal::operand("live")],
        )
        .unwrap()
        .into_operand();
        let mut table = HashMap::new();
        table.insert("status = 'live'".to_string(), condition);
        let mut ctx = context(&registry, MapResolver::new())
            .with_parser(Arc::new(TableParser { table }));

        let target = BackendTarget::query("query");
        let mut filter = Filter::new();
        let operands = vec![PropertyPath::operand("condition")];
        EvalFunction
            .generate_filter(
                OperatorCode::NamedFunction,
                &mut ctx,
                &target,
                &operands,
                ValueType::Boolean,
                &mut filter,
            )
            .unwrap();
        assert!(filter.has_deferred());

        // The expression text only becomes available at build time
        ctx.set_resolver(Arc::new(
            MapResolver::new().with("condition", "status = 'live'"),
        ));
        let built = filter.build(&mut ctx, &target).unwrap();
        assert_eq!(built.to_string(), "status = 'live'");
    }

    #[test]
    fn test_echo_passes_through() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new());
        let operands = vec![Literal::operand(Value::list([1, 2]))];
        assert_eq!(
            call(&EchoFunction, &mut ctx, &operands).unwrap(),
            Value::list([1, 2])
        );
        assert!(EchoFunction.supports_static_evaluation());
    }

    #[test]
    fn test_foreach_collects_results() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new().with("x", "outer").with("suffix", "!"));
        let body = Call::named(
            &registry,
            "concat",
            vec![PropertyPath::operand("x"), PropertyPath::operand("suffix")],
        )
        .unwrap()
        .into_operand();

        let operands = vec![
            Literal::operand(Value::list(["a", "b"])),
            Literal::operand("x"),
            body,
        ];
        assert_eq!(
            call(&ForeachFunction, &mut ctx, &operands).unwrap(),
            Value::list(["a!", "b!"])
        );
        assert_eq!(ctx.resolve("x"), Some(Value::string("outer")));
    }

    #[test]
    fn test_foreach_iterates_map_values() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new());
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), Value::Integer(1));
        entries.insert("b".to_string(), Value::Integer(2));
        let operands = vec![
            Literal::operand(Value::Map(entries)),
            Literal::operand("v"),
            PropertyPath::operand("v"),
        ];
        assert_eq!(
            call(&ForeachFunction, &mut ctx, &operands).unwrap(),
            Value::list([1, 2])
        );
    }

    #[test]
    fn test_foreach_over_scalar_is_empty() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new());
        let operands = vec![
            Literal::operand(5),
            Literal::operand("v"),
            PropertyPath::operand("v"),
        ];
        assert_eq!(
            call(&ForeachFunction, &mut ctx, &operands).unwrap(),
            Value::Collection(vec![])
        );
    }

    #[test]
    fn test_foreach_restores_context_on_failure() {
        let registry = registry();
        let mut ctx = context(&registry, MapResolver::new().with("v", "outer"));
        let operands = vec![
            Literal::operand(Value::list([1, 2])),
            Literal::operand("v"),
            Arc::new(Failing) as OperandRef,
        ];
        assert!(call(&ForeachFunction, &mut ctx, &operands).is_err());
        assert_eq!(ctx.resolve("v"), Some(Value::string("outer")));
    }
}
