//! Function registry: one [`FunctionStore`] per backend target.
//!
//! The registry is filled once at startup from the identifier catalog and is
//! read-mostly afterwards. Each store sits behind its own lock so a late
//! registration never exposes a half-filled store to concurrent readers.

pub mod catalog;
pub mod config;
pub mod store;

pub use catalog::{Catalog, Constructor, Instance, BUILTIN_FUNCTIONS};
pub use config::{RegistryConfig, DEFAULT_MAX_EVAL_DEPTH};
pub use store::{CompletenessReport, FunctionStore};

use crate::expression::{ExpressionError, ExpressionResult, OperatorCode};
use crate::expression::{RegistrationError, RegistrationResult};
use crate::function::{BackendTarget, Function};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL: Lazy<Arc<Registry>> =
    Lazy::new(|| Arc::new(Registry::bootstrap(RegistryConfig::default())));

pub struct Registry {
    config: RegistryConfig,
    catalog: RwLock<Catalog>,
    stores: DashMap<BackendTarget, Arc<RwLock<FunctionStore>>>,
}

impl Registry {
    /// Registry with the built-in catalog and no registered functions
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            catalog: RwLock::new(Catalog::builtin()),
            stores: DashMap::new(),
        }
    }

    /// Registry with every built-in and configured custom identifier
    /// registered
    pub fn bootstrap(config: RegistryConfig) -> Self {
        let registry = Self::new(config);
        registry.register_all();
        registry
    }

    /// Process-wide registry, bootstrapped with the default configuration on
    /// first use
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Make `identifier` resolvable by later registrations
    pub fn add_constructor(&self, identifier: impl Into<String>, constructor: Constructor) {
        self.catalog.write().insert(identifier, constructor);
    }

    /// Register the built-in list followed by the configured custom
    /// identifiers. A failing identifier is logged and skipped.
    ///
    /// Returns the number of identifiers registered.
    pub fn register_all(&self) -> usize {
        let identifiers = BUILTIN_FUNCTIONS
            .iter()
            .map(|(identifier, _)| identifier.to_string())
            .chain(self.config.custom_functions.iter().cloned())
            .collect::<Vec<_>>();

        let mut registered = 0;
        for identifier in &identifiers {
            match self.register_by_identifier(identifier) {
                Ok(_) => registered += 1,
                Err(e) => log::error!("Failed to register '{}': {}", identifier, e),
            }
        }
        log::info!(
            "Registered {} of {} function identifiers",
            registered,
            identifiers.len()
        );
        registered
    }

    /// Instantiate `identifier` from the catalog and register it with every
    /// backend it supports
    ///
    /// Returns the number of backends that accepted it.
    pub fn register_by_identifier(&self, identifier: &str) -> RegistrationResult<usize> {
        let function = self.catalog.read().instantiate(identifier)?;
        self.register_function(identifier, function)
    }

    /// Register an already constructed function under `identifier`
    pub fn register_function(
        &self,
        identifier: &str,
        function: Arc<dyn Function>,
    ) -> RegistrationResult<usize> {
        let backends = function.supported_backends();
        if backends.is_empty() {
            return Err(RegistrationError::NoBackends {
                identifier: identifier.to_string(),
            });
        }

        let mut accepted = 0;
        for backend in &backends {
            match self.store_for(backend) {
                Ok(store) => {
                    store.write().register(&function);
                    accepted += 1;
                }
                Err(e) => log::warn!("Skipping backend for '{}': {}", identifier, e),
            }
        }

        if accepted == 0 {
            log::warn!("'{}' was not accepted by any backend", identifier);
        } else {
            log::debug!("'{}' registered with {} backend(s)", identifier, accepted);
        }
        Ok(accepted)
    }

    /// Store for `backend`, created on first use
    pub fn store_for(
        &self,
        backend: &BackendTarget,
    ) -> RegistrationResult<Arc<RwLock<FunctionStore>>> {
        if !self.config.recognizes(backend) {
            return Err(RegistrationError::UnknownBackend {
                backend: backend.clone(),
            });
        }
        let store = self
            .stores
            .entry(backend.clone())
            .or_insert_with(|| Arc::new(RwLock::new(FunctionStore::new(backend.to_string()))));
        Ok(Arc::clone(store.value()))
    }

    pub fn operator(
        &self,
        backend: &BackendTarget,
        op: OperatorCode,
    ) -> ExpressionResult<Arc<dyn Function>> {
        let store = self.store_for(backend)?;
        let function = store.read().operator(op);
        function.ok_or_else(|| ExpressionError::UnboundOperator {
            operator: op,
            backend: backend.clone(),
        })
    }

    pub fn named(&self, backend: &BackendTarget, name: &str) -> ExpressionResult<Arc<dyn Function>> {
        let store = self.store_for(backend)?;
        let function = store.read().named(name);
        function.ok_or_else(|| ExpressionError::UnknownFunction {
            name: name.to_string(),
            backend: backend.clone(),
        })
    }

    /// Backends that currently have a store, ordered by label
    pub fn backends(&self) -> Vec<BackendTarget> {
        let mut backends: Vec<BackendTarget> =
            self.stores.iter().map(|entry| entry.key().clone()).collect();
        backends.sort_by_key(|backend| backend.to_string());
        backends
    }

    /// Completeness audit of every store
    pub fn check_all(&self) -> Vec<(BackendTarget, CompletenessReport)> {
        self.backends()
            .into_iter()
            .filter_map(|backend| {
                let store = self.stores.get(&backend).map(|s| Arc::clone(s.value()))?;
                let report = store.read().completeness_check(&backend.to_string());
                Some((backend, report))
            })
            .collect()
    }

    /// Drop every store; the catalog is kept
    pub fn reset(&self) {
        self.stores.clear();
        log::debug!("Registry reset");
    }
}
