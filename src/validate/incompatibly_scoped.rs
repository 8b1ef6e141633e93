//! Reports scoped bindings owned by components that do not declare the scope.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::BindingGraphPlugin;
use crate::diagnostics::format::{binding_trace, scoped_declaration};
use crate::diagnostics::writer::MessageWriter;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{Binding, BindingGraph, BindingKind, ComponentNode, ComponentPath, Scope};
use crate::options::{DiagnosticKind, MODULE_HAS_DIFFERENT_SCOPES_VALIDATION, ValidationOptions};

#[derive(Default)]
pub struct IncompatiblyScopedBindingsValidator {
    module_has_different_scopes: DiagnosticKind,
}

impl BindingGraphPlugin for IncompatiblyScopedBindingsValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/IncompatiblyScopedBindings"
    }

    fn supported_options(&self) -> BTreeSet<String> {
        BTreeSet::from([MODULE_HAS_DIFFERENT_SCOPES_VALIDATION.to_string()])
    }

    fn init(&mut self, options: &ValidationOptions) {
        self.module_has_different_scopes = options.module_has_different_scopes_validation;
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        let root = graph.root_component_node();
        // Injection bindings in a partial graph reappear in the real ancestor component.
        let skip_injections = root.is_subcomponent() || !root.is_real_component();

        let mut incompatible: IndexMap<&ComponentPath, Vec<&Binding>> = IndexMap::new();
        for binding in graph.bindings() {
            let Some(scope) = binding.scope.as_ref().filter(|s| !s.is_reusable()) else {
                continue;
            };
            let component = component_of(graph, &binding.component_path)?;
            if component.scopes.contains(scope) {
                continue;
            }
            if binding.kind == BindingKind::Injection && skip_injections {
                continue;
            }
            incompatible.entry(&binding.component_path).or_default().push(binding);
        }

        for (path, bindings) in incompatible {
            let component = component_of(graph, path)?;
            let current = path.current_component();
            let mut severity = Severity::Error;

            let headline = if !component.is_real_component() {
                let distinct: BTreeSet<&Scope> = bindings.iter().filter_map(|b| b.scope.as_ref()).collect();
                if distinct.len() <= 1 {
                    continue;
                }
                severity = self.module_has_different_scopes.severity();
                format!("{current} contains bindings with different scopes:")
            } else if component.scopes.is_empty() {
                format!("{current} (unscoped) may not reference scoped bindings:")
            } else {
                let scopes: Vec<String> = component.scopes.iter().map(Scope::readable).collect();
                format!(
                    "{current} scoped with {} may not reference bindings with different scopes:",
                    scopes.join(" ")
                )
            };

            let mut writer = MessageWriter::new(headline);
            writer.indent();
            for binding in bindings {
                writer.line(&incompatible_binding_line(graph, binding)?);
            }
            reporter.report_component(severity, component, &writer.finish())?;
        }
        Ok(())
    }
}

fn component_of<'g>(graph: &'g BindingGraph, path: &ComponentPath) -> Result<&'g ComponentNode, ValidationError> {
    graph
        .component_node(path)
        .ok_or_else(|| ValidationError::UnknownComponent { path: path.to_string() })
}

fn incompatible_binding_line(graph: &BindingGraph, binding: &Binding) -> Result<String, ValidationError> {
    match binding.kind {
        BindingKind::Provision | BindingKind::Delegate => {
            if binding.binding_element.is_none() {
                return Err(ValidationError::MissingBindingElement {
                    key: binding.key.to_string(),
                });
            }
            Ok(scoped_declaration(binding))
        }
        BindingKind::Injection => {
            let scope = binding
                .scope
                .as_ref()
                .map(Scope::readable)
                .unwrap_or_default();
            let class = binding
                .binding_element
                .as_ref()
                .and_then(|e| e.enclosing_type.as_ref())
                .unwrap_or(&binding.key.type_name);
            Ok(format!("{scope} class {class}{}", binding_trace(graph, binding)))
        }
        BindingKind::AssistedInjection
        | BindingKind::AssistedFactory
        | BindingKind::Production
        | BindingKind::MultiboundMap
        | BindingKind::MultiboundSet
        | BindingKind::Optional
        | BindingKind::Component
        | BindingKind::ComponentProvision
        | BindingKind::ComponentProduction
        | BindingKind::ComponentDependency
        | BindingKind::BoundInstance
        | BindingKind::SubcomponentCreator
        | BindingKind::MembersInjector
        | BindingKind::MembersInjection => Err(ValidationError::UnexpectedBindingKind {
            kind: binding.kind,
            key: binding.key.to_string(),
            context: "describing an incompatibly scoped binding",
        }),
    }
}
