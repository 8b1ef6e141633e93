//! Re-checks the types behind `@Inject` bindings.
//!
//! The checks themselves live behind [`InjectValidator`], so a front end with
//! a richer type model can supply its own.

use super::BindingGraphPlugin;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{BindingGraph, BindingKind, Nesting, TypeDescriptor, TypeKind, Visibility};

/// One problem found with an injectable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationItem {
    pub severity: Severity,
    pub message: String,
}

impl ValidationItem {
    fn error(message: &str) -> Self {
        ValidationItem {
            severity: Severity::Error,
            message: message.to_string(),
        }
    }
}

pub trait InjectValidator {
    fn validate(&self, descriptor: &TypeDescriptor) -> Vec<ValidationItem>;
}

/// Constructor and type rules for classes with an `@Inject` constructor.
#[derive(Debug, Default, Clone, Copy)]
pub struct InjectConstructorRules;

impl InjectValidator for InjectConstructorRules {
    fn validate(&self, descriptor: &TypeDescriptor) -> Vec<ValidationItem> {
        let mut items = Vec::new();
        let inject_constructors: Vec<_> = descriptor.inject_constructors().collect();

        if inject_constructors.len() > 1 {
            items.push(ValidationItem::error(
                "Types may only contain one injected constructor",
            ));
        }
        for constructor in &inject_constructors {
            if constructor.visibility == Visibility::Private {
                items.push(ValidationItem::error(
                    "Dagger does not support injection into private constructors",
                ));
            }
            if !constructor.qualifiers.is_empty() {
                items.push(ValidationItem::error(
                    "@Qualifier annotations are not allowed on @Inject constructors",
                ));
            }
            if !constructor.thrown_checked.is_empty() {
                items.push(ValidationItem::error(
                    "Dagger does not support checked exceptions on @Inject constructors",
                ));
            }
        }

        if !inject_constructors.is_empty() {
            if descriptor.nesting == Nesting::Inner {
                items.push(ValidationItem::error(
                    "@Inject constructors are invalid on inner classes. Did you mean to make the class static?",
                ));
            }
            if descriptor.kind != TypeKind::Class {
                items.push(ValidationItem::error(
                    "@Inject is nonsense on the constructor of an abstract class",
                ));
            }
            if descriptor.visibility == Visibility::Private {
                items.push(ValidationItem::error(
                    "Dagger does not support injection into private classes",
                ));
            }
        }

        if descriptor.scopes.len() > 1 {
            let scopes: Vec<String> = descriptor.scopes.iter().map(|s| s.readable()).collect();
            items.push(ValidationItem {
                severity: Severity::Error,
                message: format!(
                    "A single binding may not declare more than one @Scope: {}",
                    scopes.join(", ")
                ),
            });
        }
        items
    }
}

pub struct InjectBindingValidator {
    validator: Box<dyn InjectValidator>,
}

impl InjectBindingValidator {
    pub fn new(validator: Box<dyn InjectValidator>) -> Self {
        InjectBindingValidator { validator }
    }
}

impl Default for InjectBindingValidator {
    fn default() -> Self {
        Self::new(Box::new(InjectConstructorRules))
    }
}

impl BindingGraphPlugin for InjectBindingValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/InjectBinding"
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        for binding in graph.bindings().filter(|b| b.kind == BindingKind::Injection) {
            let type_name = binding
                .binding_element
                .as_ref()
                .and_then(|e| e.enclosing_type.as_ref())
                .unwrap_or(&binding.key.type_name);
            // Nothing to re-check for types the front end did not describe.
            let Some(descriptor) = graph.type_descriptor(type_name.raw_name()) else {
                continue;
            };
            for item in self.validator.validate(descriptor) {
                reporter.report_binding(item.severity, binding, &item.message)?;
            }
        }
        Ok(())
    }
}
