//! Operand nodes handed to functions.
//!
//! Operands are evaluated lazily: a function receives the unevaluated nodes
//! and decides which of them to evaluate. The parser that builds operand
//! trees lives outside this crate; `Literal`, `PropertyPath` and `Call` are
//! the stock nodes it assembles.

use crate::expression::{
    Arity, EvalContext, ExpressionError, ExpressionResult, Filter, FilterFragment, FilterTerm,
    OperatorCode,
};
use crate::function::{BackendTarget, Function};
use crate::registry::Registry;
use crate::value::{coerce, Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// Shared handle to an operand node
pub type OperandRef = Arc<dyn Operand>;

/// A lazily-evaluable expression node
pub trait Operand: Send + Sync + fmt::Debug {
    fn evaluate(&self, ctx: &mut EvalContext, expected: ValueType) -> ExpressionResult<Value>;

    /// This operand as one side of a filter predicate
    fn filter_term(&self, ctx: &mut EvalContext) -> ExpressionResult<FilterTerm> {
        Ok(FilterTerm::Constant(self.evaluate(ctx, ValueType::Any)?))
    }

    /// Append this operand, used as a condition, to `filter`
    fn generate_filter(
        &self,
        ctx: &mut EvalContext,
        _target: &BackendTarget,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        let value = self.evaluate(ctx, ValueType::Boolean)?;
        filter.add_fragment(FilterFragment::Constant(coerce::to_boolean(&value)));
        Ok(())
    }

    /// Whether evaluation never depends on the context
    fn is_constant(&self) -> bool {
        false
    }
}

/// Constant value
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn null() -> Self {
        Self { value: Value::Null }
    }

    /// Shorthand for a shared literal operand
    pub fn operand(value: impl Into<Value>) -> OperandRef {
        Arc::new(Self::new(value))
    }
}

impl Operand for Literal {
    fn evaluate(&self, _ctx: &mut EvalContext, _expected: ValueType) -> ExpressionResult<Value> {
        Ok(self.value.clone())
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// Dotted property path resolved through the context
///
/// The first segment is looked up in the current resolver; each further
/// segment steps through an object's `Resolvable` capability or a map.
/// Stepping through a collection applies the rest of the path to every item
/// and yields a `Value::Nested`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn parse(path: &str) -> Self {
        Self::new(path.split('.').map(str::to_string).collect())
    }

    pub fn operand(path: &str) -> OperandRef {
        Arc::new(Self::parse(path))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    fn step(value: &Value, segment: &str) -> Value {
        match value {
            Value::Object(obj) => obj
                .as_resolvable()
                .and_then(|r| r.get(segment))
                .unwrap_or(Value::Null),
            Value::Map(entries) => entries.get(segment).cloned().unwrap_or(Value::Null),
            Value::Collection(items) | Value::Nested(items) => {
                Value::Nested(items.iter().map(|item| Self::step(item, segment)).collect())
            }
            _ => Value::Null,
        }
    }
}

impl Operand for PropertyPath {
    fn evaluate(&self, ctx: &mut EvalContext, _expected: ValueType) -> ExpressionResult<Value> {
        let Some((first, rest)) = self.segments.split_first() else {
            return Ok(Value::Null);
        };
        let mut value = ctx.resolve(first).unwrap_or(Value::Null);
        for segment in rest {
            value = Self::step(&value, segment);
        }
        Ok(value)
    }

    fn filter_term(&self, _ctx: &mut EvalContext) -> ExpressionResult<FilterTerm> {
        Ok(FilterTerm::Field(self.path()))
    }

    fn generate_filter(
        &self,
        _ctx: &mut EvalContext,
        _target: &BackendTarget,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        filter.add_fragment(FilterFragment::Predicate {
            operator: OperatorCode::Equal,
            left: FilterTerm::Field(self.path()),
            right: FilterTerm::Constant(Value::Boolean(true)),
        });
        Ok(())
    }
}

/// Invocation of an operator or named function
///
/// The function is bound and the operand count validated when the call is
/// built, so evaluation never sees an operand array outside the arity.
#[derive(Debug, Clone)]
pub struct Call {
    operator: OperatorCode,
    function: Arc<dyn Function>,
    operands: Vec<OperandRef>,
}

impl Call {
    /// Bind an operator from the registry's direct-evaluation store
    pub fn operator(
        registry: &Registry,
        operator: OperatorCode,
        operands: Vec<OperandRef>,
    ) -> ExpressionResult<Self> {
        Self::operator_for(registry, &BackendTarget::Direct, operator, operands)
    }

    /// Bind a named function from the registry's direct-evaluation store
    pub fn named(
        registry: &Registry,
        name: &str,
        operands: Vec<OperandRef>,
    ) -> ExpressionResult<Self> {
        Self::named_for(registry, &BackendTarget::Direct, name, operands)
    }

    /// Bind an operator from the store of `backend`
    pub fn operator_for(
        registry: &Registry,
        backend: &BackendTarget,
        operator: OperatorCode,
        operands: Vec<OperandRef>,
    ) -> ExpressionResult<Self> {
        let function = registry.operator(backend, operator)?;
        Self::bind(operator, function, operands)
    }

    /// Bind a named function from the store of `backend`, for functions
    /// registered with a query backend only
    pub fn named_for(
        registry: &Registry,
        backend: &BackendTarget,
        name: &str,
        operands: Vec<OperandRef>,
    ) -> ExpressionResult<Self> {
        let function = registry.named(backend, name)?;
        Self::bind(OperatorCode::NamedFunction, function, operands)
    }

    /// Bind an explicit function instance
    pub fn bind(
        operator: OperatorCode,
        function: Arc<dyn Function>,
        operands: Vec<OperandRef>,
    ) -> ExpressionResult<Self> {
        let arity: Arity = function.arity();
        if !arity.accepts(operands.len()) {
            return Err(ExpressionError::ArityMismatch {
                function: function.label(),
                arity,
                actual: operands.len(),
            });
        }
        Ok(Self {
            operator,
            function,
            operands,
        })
    }

    pub fn into_operand(self) -> OperandRef {
        Arc::new(self)
    }

    pub fn function(&self) -> &Arc<dyn Function> {
        &self.function
    }

    pub fn operands(&self) -> &[OperandRef] {
        &self.operands
    }

    /// The implementation registered for `target`, which may differ from the
    /// direct-evaluation one bound at construction
    fn function_for(
        &self,
        registry: &Registry,
        target: &BackendTarget,
    ) -> ExpressionResult<Arc<dyn Function>> {
        if target.is_direct() {
            return Ok(Arc::clone(&self.function));
        }
        match self.operator {
            OperatorCode::NamedFunction => {
                let name = self.function.name().unwrap_or_default();
                registry.named(target, name)
            }
            op => registry.operator(target, op),
        }
    }
}

impl Operand for Call {
    fn evaluate(&self, ctx: &mut EvalContext, expected: ValueType) -> ExpressionResult<Value> {
        if !self.function.mode().can_evaluate() {
            return Err(ExpressionError::NotImplemented {
                function: self.function.label(),
                operator: self.operator,
            });
        }
        self.function
            .evaluate(self.operator, ctx, &self.operands, expected)
    }

    fn generate_filter(
        &self,
        ctx: &mut EvalContext,
        target: &BackendTarget,
        filter: &mut Filter,
    ) -> ExpressionResult<()> {
        let registry = Arc::clone(ctx.registry());
        let function = self.function_for(&registry, target)?;
        if !function.mode().can_generate_filter() {
            return Err(ExpressionError::FilterGenerationNotImplemented {
                function: function.label(),
                operator: self.operator,
            });
        }
        function.generate_filter(
            self.operator,
            ctx,
            target,
            &self.operands,
            ValueType::Boolean,
            filter,
        )
    }

    fn is_constant(&self) -> bool {
        self.function.supports_static_evaluation()
            && self.operands.iter().all(|operand| operand.is_constant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::MapResolver;
    use crate::registry::RegistryConfig;
    use crate::value::{ObjectValue, Resolvable};
    use std::collections::BTreeMap;

    #[derive(Debug)]
    struct Page {
        title: &'static str,
    }

    impl ObjectValue for Page {
        fn type_name(&self) -> &str {
            "page"
        }

        fn as_resolvable(&self) -> Option<&dyn Resolvable> {
            Some(self)
        }
    }

    impl Resolvable for Page {
        fn get(&self, name: &str) -> Option<Value> {
            match name {
                "title" => Some(Value::string(self.title)),
                _ => None,
            }
        }
    }

    fn context(resolver: MapResolver) -> EvalContext {
        let registry = Arc::new(Registry::bootstrap(RegistryConfig::default()));
        EvalContext::new(registry, Arc::new(resolver))
    }

    #[test]
    fn test_literal() {
        let mut ctx = context(MapResolver::new());
        let lit = Literal::new(5);
        assert!(lit.is_constant());
        assert_eq!(
            lit.evaluate(&mut ctx, ValueType::Any).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            Literal::null().evaluate(&mut ctx, ValueType::Any).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_property_path_through_objects_and_maps() {
        let mut settings = BTreeMap::new();
        settings.insert("lang".to_string(), Value::string("en"));
        let resolver = MapResolver::new()
            .with("page", Value::object(Page { title: "Home" }))
            .with("settings", Value::Map(settings));
        let mut ctx = context(resolver);

        let title = PropertyPath::parse("page.title");
        assert_eq!(
            title.evaluate(&mut ctx, ValueType::Any).unwrap(),
            Value::string("Home")
        );
        let lang = PropertyPath::parse("settings.lang");
        assert_eq!(
            lang.evaluate(&mut ctx, ValueType::Any).unwrap(),
            Value::string("en")
        );
        let missing = PropertyPath::parse("page.author.name");
        assert_eq!(
            missing.evaluate(&mut ctx, ValueType::Any).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_property_path_through_collection_nests() {
        let pages = Value::list([
            Value::object(Page { title: "One" }),
            Value::object(Page { title: "Two" }),
        ]);
        let mut ctx = context(MapResolver::new().with("pages", pages));

        let titles = PropertyPath::parse("pages.title");
        assert_eq!(
            titles.evaluate(&mut ctx, ValueType::Any).unwrap(),
            Value::Nested(vec![Value::string("One"), Value::string("Two")])
        );
    }

    #[test]
    fn test_call_rejects_bad_arity() {
        let ctx = context(MapResolver::new());
        let err = Call::named(ctx.registry(), "concat", vec![Literal::operand("a")]).unwrap_err();
        assert!(matches!(err, ExpressionError::ArityMismatch { actual: 1, .. }));
    }

    #[derive(Debug)]
    struct DistinguishedName;

    impl Function for DistinguishedName {
        fn supported_operators(&self) -> &[OperatorCode] {
            &[OperatorCode::NamedFunction]
        }

        fn supported_backends(&self) -> Vec<BackendTarget> {
            vec![BackendTarget::query("ldap")]
        }

        fn arity(&self) -> Arity {
            Arity::exactly(1)
        }

        fn name(&self) -> Option<&str> {
            Some("dn")
        }

        fn expected_result_type(&self, _op: OperatorCode) -> ValueType {
            ValueType::String
        }

        fn evaluate(
            &self,
            _op: OperatorCode,
            ctx: &mut EvalContext,
            operands: &[OperandRef],
            _expected: ValueType,
        ) -> ExpressionResult<Value> {
            let cn = operands[0].evaluate(ctx, ValueType::String)?;
            Ok(Value::string(format!("cn={},dc=example", cn)))
        }
    }

    #[test]
    fn test_call_binds_from_query_backend() {
        let registry = Arc::new(Registry::bootstrap(
            RegistryConfig::default().with_query_backend("ldap"),
        ));
        registry
            .register_function("custom:dn", Arc::new(DistinguishedName))
            .unwrap();
        let ldap = BackendTarget::query("ldap");

        assert!(matches!(
            Call::named(&registry, "dn", vec![Literal::operand("ada")]),
            Err(ExpressionError::UnknownFunction { .. })
        ));
        let call = Call::named_for(&registry, &ldap, "dn", vec![Literal::operand("ada")]).unwrap();
        let mut ctx = EvalContext::new(Arc::clone(&registry), Arc::new(MapResolver::new()));
        assert_eq!(
            call.evaluate(&mut ctx, ValueType::String).unwrap(),
            Value::string("cn=ada,dc=example")
        );

        assert!(matches!(
            Call::operator_for(&registry, &ldap, OperatorCode::Add, vec![]),
            Err(ExpressionError::UnboundOperator { .. })
        ));
        let add = Call::operator_for(
            &registry,
            &BackendTarget::query("query"),
            OperatorCode::Add,
            vec![Literal::operand(1), Literal::operand(2)],
        )
        .unwrap();
        assert_eq!(add.evaluate(&mut ctx, ValueType::Number).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_call_constant_folding_flag() {
        let ctx = context(MapResolver::new());
        let constant = Call::operator(
            ctx.registry(),
            OperatorCode::Add,
            vec![Literal::operand(1), Literal::operand(2)],
        )
        .unwrap();
        assert!(constant.is_constant());

        let dynamic = Call::operator(
            ctx.registry(),
            OperatorCode::Add,
            vec![Literal::operand(1), PropertyPath::operand("x")],
        )
        .unwrap();
        assert!(!dynamic.is_constant());
    }

    #[test]
    fn test_property_path_filter_term() {
        let mut ctx = context(MapResolver::new());
        let path = PropertyPath::parse("page.rank");
        assert_eq!(
            path.filter_term(&mut ctx).unwrap(),
            FilterTerm::Field("page.rank".to_string())
        );
        assert_eq!(
            Literal::new(3).filter_term(&mut ctx).unwrap(),
            FilterTerm::Constant(Value::Integer(3))
        );
    }
}
