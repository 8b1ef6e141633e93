//! Reports requested keys that have no binding.

use indexmap::IndexMap;

use super::BindingGraphPlugin;
use crate::diagnostics::format::dependency_trace;
use crate::diagnostics::writer::INDENT;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{
    Binding, BindingGraph, ComponentPath, DependencyEdgeRef, MissingBinding, Node, RequestKind,
};

pub struct MissingBindingValidator;

impl BindingGraphPlugin for MissingBindingValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/MissingBinding"
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        // Missing bindings in a full graph or a subcomponent's graph may be
        // satisfied once the real root component is known.
        if graph.is_full_binding_graph() || graph.root_component_node().is_subcomponent() {
            return Ok(());
        }
        for missing in graph.missing_bindings() {
            let component = graph.component_node(&missing.component_path).ok_or_else(|| {
                ValidationError::UnknownComponent {
                    path: missing.component_path.to_string(),
                }
            })?;
            let message = missing_binding_message(graph, missing)?;
            reporter.report_component(Severity::Error, component, &message)?;
        }
        Ok(())
    }
}

fn missing_binding_message(graph: &BindingGraph, missing: &MissingBinding) -> Result<String, ValidationError> {
    let key = &missing.key;
    if key.type_name.is_wildcard() {
        return Err(ValidationError::WildcardKey { key: key.to_string() });
    }
    let requests = graph.requests_for_missing(missing);

    let mut message = format!("{key} cannot be provided without ");
    if key.is_valid_implicit_provision_key() {
        message.push_str("an @Inject constructor or ");
    }
    message.push_str("a @Provides-");
    if all_requests_can_use_production(graph, &requests) {
        message.push_str(" or @Produces-");
    }
    message.push_str("annotated method.");
    message.push_str(&dependency_trace(graph, key, &requests));
    message.push_str(&alternative_components(graph, missing));
    Ok(message)
}

fn all_requests_can_use_production(graph: &BindingGraph, requests: &[DependencyEdgeRef<'_>]) -> bool {
    !requests.is_empty()
        && requests.iter().all(|request| match graph.node(request.source) {
            Node::Binding(binding) => binding.kind.is_production(),
            Node::Component(_) => matches!(
                request.edge.request.kind,
                RequestKind::Producer | RequestKind::Produced | RequestKind::Future
            ),
            Node::MissingBinding(_) => false,
        })
}

/// A note listing other components that do bind the key, which usually means
/// the requesting component is missing a dependency or a module.
fn alternative_components(graph: &BindingGraph, missing: &MissingBinding) -> String {
    let key = missing.key.to_string();
    let mut alternatives: IndexMap<&ComponentPath, &Binding> = IndexMap::new();
    for binding in graph.bindings() {
        if binding.key.to_string() != key || binding.component_path == missing.component_path {
            continue;
        }
        if !installs_contributing_module(graph, binding) {
            continue;
        }
        alternatives.entry(&binding.component_path).or_insert(binding);
    }
    if alternatives.is_empty() {
        return String::new();
    }

    let mut note = format!("\n\nNote: {key} is provided in the following other components:");
    for (path, binding) in alternatives {
        note.push_str(&format!(
            "\n{INDENT}{}: {binding}",
            path.current_component()
        ));
    }
    note
}

/// False for copies of a module binding resolved into a component that does
/// not install the module itself.
fn installs_contributing_module(graph: &BindingGraph, binding: &Binding) -> bool {
    let Some(module) = &binding.contributing_module else {
        return true;
    };
    graph
        .component_node(&binding.component_path)
        .is_some_and(|c| c.modules.contains(module))
}
