//! Per-backend function store.

use crate::expression::OperatorCode;
use crate::function::Function;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a completeness audit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletenessReport {
    pub filled: Vec<OperatorCode>,
    pub missing: Vec<OperatorCode>,
    /// Named functions are listed, never required
    pub named: Vec<String>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// One implementation slot per operator code plus a map of named functions
///
/// Later registrations replace earlier ones; a replacement is logged.
pub struct FunctionStore {
    label: String,
    operators: [Option<Arc<dyn Function>>; OperatorCode::SLOTS],
    named: HashMap<String, Arc<dyn Function>>,
}

impl FunctionStore {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            operators: std::array::from_fn(|_| None),
            named: HashMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bind `function` to every operator slot it supports, and under its
    /// name if it is a named function
    pub fn register(&mut self, function: &Arc<dyn Function>) {
        for op in function.supported_operators() {
            match op.slot() {
                Some(slot) => {
                    if let Some(previous) = &self.operators[slot] {
                        if !same_instance(previous, function) {
                            log::warn!(
                                "{}: operator {} rebound from {} to {}",
                                self.label,
                                op,
                                previous.label(),
                                function.label()
                            );
                        }
                    }
                    self.operators[slot] = Some(Arc::clone(function));
                }
                None => self.register_named(function),
            }
        }
    }

    fn register_named(&mut self, function: &Arc<dyn Function>) {
        let Some(name) = function.name().filter(|name| !name.is_empty()) else {
            log::error!(
                "{}: named function {:?} has no name, skipping its named slot",
                self.label,
                function
            );
            return;
        };
        let previous = self.named.insert(name.to_string(), Arc::clone(function));
        if let Some(previous) = previous {
            if !same_instance(&previous, function) {
                log::warn!("{}: named function '{}' replaced", self.label, name);
            }
        }
    }

    pub fn operator(&self, op: OperatorCode) -> Option<Arc<dyn Function>> {
        op.slot()
            .and_then(|slot| self.operators[slot].as_ref())
            .map(Arc::clone)
    }

    pub fn named(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.named.get(name).map(Arc::clone)
    }

    /// Registered function names, sorted
    pub fn named_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.named.keys().cloned().collect();
        names.sort();
        names
    }

    /// Log, per required operator, whether a slot is filled
    ///
    /// A missing operator is not an error here; it only fails when invoked.
    pub fn completeness_check(&self, store_label: &str) -> CompletenessReport {
        let mut report = CompletenessReport {
            named: self.named_functions(),
            ..Default::default()
        };
        for op in OperatorCode::REQUIRED {
            match self.operator(op) {
                Some(function) => {
                    log::info!("{}: operator {} -> {}", store_label, op, function.label());
                    report.filled.push(op);
                }
                None => {
                    log::warn!("{}: operator {} is not bound", store_label, op);
                    report.missing.push(op);
                }
            }
        }
        log::info!(
            "{}: {} of {} operators bound, named functions: [{}]",
            store_label,
            report.filled.len(),
            OperatorCode::REQUIRED.len(),
            report.named.join(", ")
        );
        report
    }
}

fn same_instance(a: &Arc<dyn Function>, b: &Arc<dyn Function>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
