//! Static identifier catalog.
//!
//! Maps registration identifiers to constructors. A constructor returns a
//! type-erased instance; only instances that turn out to be an
//! `Arc<dyn Function>` can be registered.

use crate::expression::{RegistrationError, RegistrationResult};
use crate::function::{
    AndFunction, ArithmeticFunction, ComparisonFunction, ConcatFunction, DoFunction,
    EchoFunction, EvalFunction, ExtendedComparisonFunction, ForeachFunction, FromArrayFunction,
    Function, GetFunction, IfFunction, InsertFunction, IsEmptyFunction, NotFunction, OrFunction,
    SetFunction, UnaryArithmeticFunction,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased constructed instance
pub type Instance = Box<dyn Any + Send + Sync>;

/// Builds a fresh instance, or explains why it could not
pub type Constructor = fn() -> Result<Instance, String>;

/// Constructor for any default-constructible function
pub fn construct<F: Function + Default + 'static>() -> Result<Instance, String> {
    let function: Arc<dyn Function> = Arc::new(F::default());
    Ok(Box::new(function))
}

/// Built-in identifiers in bootstrap order: operators first, then named
/// functions
pub const BUILTIN_FUNCTIONS: &[(&str, Constructor)] = &[
    ("builtin:and", construct::<AndFunction> as Constructor),
    ("builtin:or", construct::<OrFunction>),
    ("builtin:not", construct::<NotFunction>),
    ("builtin:comparison", construct::<ComparisonFunction>),
    ("builtin:extended_comparison", construct::<ExtendedComparisonFunction>),
    ("builtin:arithmetic", construct::<ArithmeticFunction>),
    ("builtin:unary_arithmetic", construct::<UnaryArithmeticFunction>),
    ("builtin:concat", construct::<ConcatFunction>),
    ("builtin:do", construct::<DoFunction>),
    ("builtin:eval", construct::<EvalFunction>),
    ("builtin:echo", construct::<EchoFunction>),
    ("builtin:foreach", construct::<ForeachFunction>),
    ("builtin:from_array", construct::<FromArrayFunction>),
    ("builtin:get", construct::<GetFunction>),
    ("builtin:set", construct::<SetFunction>),
    ("builtin:if", construct::<IfFunction>),
    ("builtin:insert", construct::<InsertFunction>),
    ("builtin:isempty", construct::<IsEmptyFunction>),
];

pub struct Catalog {
    constructors: HashMap<String, Constructor>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Catalog holding every built-in identifier
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (identifier, constructor) in BUILTIN_FUNCTIONS {
            catalog.insert(*identifier, *constructor);
        }
        catalog
    }

    pub fn insert(&mut self, identifier: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(identifier.into(), constructor);
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }

    /// Resolve and construct `identifier` as a function
    pub fn instantiate(&self, identifier: &str) -> RegistrationResult<Arc<dyn Function>> {
        let constructor =
            self.constructors
                .get(identifier)
                .ok_or_else(|| RegistrationError::NotFound {
                    identifier: identifier.to_string(),
                })?;
        let instance = constructor().map_err(|reason| RegistrationError::Instantiation {
            identifier: identifier.to_string(),
            reason,
        })?;
        instance
            .downcast::<Arc<dyn Function>>()
            .map(|function| *function)
            .map_err(|_| RegistrationError::NotAFunction {
                identifier: identifier.to_string(),
            })
    }
}
