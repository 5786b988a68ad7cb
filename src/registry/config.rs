//! Registry configuration.

use crate::function::{BackendTarget, DEFAULT_QUERY_BACKEND};

/// Default limit on nested `eval` depth
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 32;

/// Configuration for a [`Registry`](crate::registry::Registry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Recognised query backend kinds
    pub query_backends: Vec<String>,
    /// Identifiers registered after the built-in bootstrap list
    pub custom_functions: Vec<String>,
    pub max_eval_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            query_backends: vec![DEFAULT_QUERY_BACKEND.to_string()],
            custom_functions: Vec::new(),
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }
}

impl RegistryConfig {
    pub fn with_query_backend(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        if !self.query_backends.contains(&kind) {
            self.query_backends.push(kind);
        }
        self
    }

    pub fn with_custom_function(mut self, identifier: impl Into<String>) -> Self {
        self.custom_functions.push(identifier.into());
        self
    }

    pub fn with_max_eval_depth(mut self, depth: usize) -> Self {
        self.max_eval_depth = depth;
        self
    }

    /// Whether `backend` is the direct backend or a configured query kind
    pub fn recognizes(&self, backend: &BackendTarget) -> bool {
        match backend {
            BackendTarget::Direct => true,
            BackendTarget::Query(kind) => self.query_backends.iter().any(|k| k == kind),
        }
    }
}
