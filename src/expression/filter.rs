//! Filter fragments for query backends.
//!
//! In filter-generation mode functions do not return values; they append
//! fragments to a [`Filter`]. The accumulated fragments form a conjunction
//! that the query backend translates into its own query language. A fragment
//! may be deferred: its generator runs only when the filter is built, against
//! the context available at that time.

use crate::expression::{EvalContext, ExpressionResult, OperatorCode};
use crate::function::BackendTarget;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// One side of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    /// A stored field, addressed by its property path
    Field(String),
    Constant(Value),
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTerm::Field(path) => write!(f, "{}", path),
            FilterTerm::Constant(Value::String(s)) => write!(f, "'{}'", s),
            FilterTerm::Constant(value) => write!(f, "{}", value),
        }
    }
}

/// Produces fragments lazily at filter-build time
pub trait FragmentGenerator: Send + Sync + fmt::Debug {
    fn generate(
        &self,
        ctx: &mut EvalContext,
        target: &BackendTarget,
        filter: &mut Filter,
    ) -> ExpressionResult<()>;
}

/// A composable piece of a backend filter
#[derive(Debug, Clone)]
pub enum FilterFragment {
    /// Matches everything (`true`) or nothing (`false`)
    Constant(bool),
    Predicate {
        operator: OperatorCode,
        left: FilterTerm,
        right: FilterTerm,
    },
    Not(Filter),
    Deferred(Arc<dyn FragmentGenerator>),
}

/// Accumulator for filter fragments, combined by conjunction
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fragments: Vec<FilterFragment>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_fragment(&mut self, fragment: FilterFragment) {
        self.fragments.push(fragment);
    }

    /// Move every fragment of `other` onto the end of this filter
    pub fn append(&mut self, other: Filter) {
        self.fragments.extend(other.fragments);
    }

    pub fn fragments(&self) -> &[FilterFragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Whether any fragment, at any depth, is still deferred
    pub fn has_deferred(&self) -> bool {
        self.fragments.iter().any(|fragment| match fragment {
            FilterFragment::Deferred(_) => true,
            FilterFragment::Not(inner) => inner.has_deferred(),
            _ => false,
        })
    }

    /// Expand deferred fragments against `ctx`, producing a filter with no
    /// deferred parts
    pub fn build(&self, ctx: &mut EvalContext, target: &BackendTarget) -> ExpressionResult<Filter> {
        let mut built = Filter::new();
        for fragment in &self.fragments {
            match fragment {
                FilterFragment::Deferred(generator) => {
                    let mut generated = Filter::new();
                    generator.generate(ctx, target, &mut generated)?;
                    built.append(generated.build(ctx, target)?);
                }
                FilterFragment::Not(inner) => {
                    built.add_fragment(FilterFragment::Not(inner.build(ctx, target)?));
                }
                other => built.add_fragment(other.clone()),
            }
        }
        Ok(built)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fragments.is_empty() {
            return write!(f, "TRUE");
        }
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            match fragment {
                FilterFragment::Constant(true) => write!(f, "TRUE")?,
                FilterFragment::Constant(false) => write!(f, "FALSE")?,
                FilterFragment::Predicate {
                    operator,
                    left,
                    right,
                } => write!(f, "{} {} {}", left, operator, right)?,
                FilterFragment::Not(inner) => write!(f, "NOT ({})", inner)?,
                FilterFragment::Deferred(_) => write!(f, "<deferred>")?,
            }
        }
        Ok(())
    }
}
