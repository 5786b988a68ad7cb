//! Request-scoped evaluation context.
//!
//! A context is owned by exactly one request. `foreach` layers loop variables
//! over the current resolver through [`ScopeGuard`], and nested `eval` tracks
//! its depth through [`NestedGuard`]; both restore the context when dropped,
//! including on the error path.

use crate::expression::{ExpressionError, ExpressionResult, OperandRef};
use crate::registry::Registry;
use crate::value::Value;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Resolves top-level names to values
pub trait Resolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// Parses nested expression text for `eval`
pub trait ExpressionParser: Send + Sync {
    fn parse(&self, text: &str)
        -> Result<OperandRef, Box<dyn std::error::Error + Send + Sync>>;
}

/// Resolver backed by a map of names
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    values: HashMap<String, Value>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }
}

impl Resolver for MapResolver {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// One binding shadowing an enclosing resolver
pub struct LayeredResolver {
    name: String,
    value: Value,
    parent: Arc<dyn Resolver>,
}

impl LayeredResolver {
    pub fn new(name: impl Into<String>, value: Value, parent: Arc<dyn Resolver>) -> Self {
        Self {
            name: name.into(),
            value,
            parent,
        }
    }
}

impl Resolver for LayeredResolver {
    fn resolve(&self, name: &str) -> Option<Value> {
        if name == self.name {
            Some(self.value.clone())
        } else {
            self.parent.resolve(name)
        }
    }
}

/// Evaluation state for one request
pub struct EvalContext {
    registry: Arc<Registry>,
    resolver: Arc<dyn Resolver>,
    parser: Option<Arc<dyn ExpressionParser>>,
    depth: usize,
}

impl EvalContext {
    pub fn new(registry: Arc<Registry>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            registry,
            resolver,
            parser: None,
            depth: 0,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn ExpressionParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn parser(&self) -> Option<&Arc<dyn ExpressionParser>> {
        self.parser.as_ref()
    }

    pub fn current_resolver(&self) -> Arc<dyn Resolver> {
        Arc::clone(&self.resolver)
    }

    /// Install `resolver`, returning the one it replaces
    pub fn set_resolver(&mut self, resolver: Arc<dyn Resolver>) -> Arc<dyn Resolver> {
        std::mem::replace(&mut self.resolver, resolver)
    }

    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.resolver.resolve(name)
    }

    /// Current nested `eval` depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Shadow `name` with `value` until the returned guard is dropped
    pub fn push_scope(&mut self, name: impl Into<String>, value: Value) -> ScopeGuard<'_> {
        let layered = LayeredResolver::new(name, value, self.current_resolver());
        let previous = self.set_resolver(Arc::new(layered));
        ScopeGuard {
            ctx: self,
            previous: Some(previous),
        }
    }

    /// Enter one level of nested expression evaluation
    pub fn enter_nested(&mut self) -> ExpressionResult<NestedGuard<'_>> {
        let limit = self.registry.config().max_eval_depth;
        if self.depth >= limit {
            return Err(ExpressionError::RecursionLimit { limit });
        }
        self.depth += 1;
        Ok(NestedGuard { ctx: self })
    }
}

/// Restores the enclosing resolver on drop
pub struct ScopeGuard<'a> {
    ctx: &'a mut EvalContext,
    previous: Option<Arc<dyn Resolver>>,
}

impl Deref for ScopeGuard<'_> {
    type Target = EvalContext;

    fn deref(&self) -> &EvalContext {
        self.ctx
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut EvalContext {
        self.ctx
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.ctx.resolver = previous;
        }
    }
}

/// Decrements the nested depth on drop
pub struct NestedGuard<'a> {
    ctx: &'a mut EvalContext,
}

impl Deref for NestedGuard<'_> {
    type Target = EvalContext;

    fn deref(&self) -> &EvalContext {
        self.ctx
    }
}

impl DerefMut for NestedGuard<'_> {
    fn deref_mut(&mut self) -> &mut EvalContext {
        self.ctx
    }
}

impl Drop for NestedGuard<'_> {
    fn drop(&mut self) {
        self.ctx.depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryConfig;

    fn context() -> EvalContext {
        let registry = Arc::new(Registry::new(RegistryConfig::default().with_max_eval_depth(2)));
        let resolver = MapResolver::new().with("x", 1).with("y", "outer");
        EvalContext::new(registry, Arc::new(resolver))
    }

    #[test]
    fn test_scope_shadows_and_restores() {
        let mut ctx = context();
        {
            let scope = ctx.push_scope("x", Value::Integer(42));
            assert_eq!(scope.resolve("x"), Some(Value::Integer(42)));
            // Unshadowed names still reach the enclosing resolver
            assert_eq!(scope.resolve("y"), Some(Value::string("outer")));
        }
        assert_eq!(ctx.resolve("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_nested_scopes() {
        let mut ctx = context();
        let mut outer = ctx.push_scope("a", Value::Integer(1));
        {
            let inner = outer.push_scope("b", Value::Integer(2));
            assert_eq!(inner.resolve("a"), Some(Value::Integer(1)));
            assert_eq!(inner.resolve("b"), Some(Value::Integer(2)));
        }
        assert_eq!(outer.resolve("b"), None);
        drop(outer);
        assert_eq!(ctx.resolve("a"), None);
    }

    #[test]
    fn test_depth_limit() {
        let mut ctx = context();
        {
            let mut first = ctx.enter_nested().unwrap();
            let mut second = first.enter_nested().unwrap();
            assert_eq!(second.depth(), 2);
            assert!(matches!(
                second.enter_nested(),
                Err(ExpressionError::RecursionLimit { limit: 2 })
            ));
        }
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_set_resolver_returns_previous() {
        let mut ctx = context();
        let previous = ctx.set_resolver(Arc::new(MapResolver::new()));
        assert_eq!(ctx.resolve("x"), None);
        assert_eq!(previous.resolve("x"), Some(Value::Integer(1)));
    }
}
