//! Reports subcomponent factory methods that omit modules the child cannot
//! instantiate on its own.

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::trace;

use super::BindingGraphPlugin;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{BindingGraph, ChildFactoryMethodEdge, ComponentNode, ComponentPath, TypeName};

pub struct SubcomponentFactoryMethodValidator;

impl BindingGraphPlugin for SubcomponentFactoryMethodValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/SubcomponentFactoryMethodMissingModule"
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        let root = graph.root_component_node();
        // Module ownership is only known once the real root component is.
        if !root.is_real_component() || root.is_subcomponent() {
            return Ok(());
        }

        let mut ownership = ModuleOwnership::new(graph);
        for edge in graph.child_factory_method_edges() {
            let missing = find_missing_modules(graph, edge, &mut ownership)?;
            if missing.is_empty() {
                continue;
            }
            let modules: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
            reporter.report_subcomponent_factory_method_fmt(
                Severity::Error,
                edge,
                format_args!(
                    "{} requires modules which have no visible default constructors. \
                     Add the following modules as parameters to this method: {}",
                    edge.child.current_component(),
                    modules.join(", ")
                ),
            )?;
        }
        Ok(())
    }
}

fn find_missing_modules<'g>(
    graph: &'g BindingGraph,
    edge: &ChildFactoryMethodEdge,
    ownership: &mut ModuleOwnership<'g>,
) -> Result<IndexSet<&'g TypeName>, ValidationError> {
    let child = ownership.component(&edge.child)?;
    let owned = ownership.owned(child)?;
    let parameters = &edge.factory_method.parameters;

    let mut missing = IndexSet::new();
    for binding in graph.bindings() {
        if binding.component_path != edge.child || !binding.requires_module_instance {
            continue;
        }
        let module = binding
            .contributing_module
            .as_ref()
            .ok_or_else(|| ValidationError::MissingContributingModule {
                key: binding.key.to_string(),
            })?;
        if !owned.contains(module) {
            continue;
        }
        if parameters.iter().any(|p| p.raw_name() == module.raw_name()) {
            continue;
        }
        if can_make_new_instances(graph, module) {
            continue;
        }
        trace!(%module, child = %edge.child, "module must be passed to factory method");
        missing.insert(module);
    }
    Ok(missing)
}

/// Modules without a type description are assumed to be ordinary public
/// classes with an implicit no-arg constructor.
fn can_make_new_instances(graph: &BindingGraph, module: &TypeName) -> bool {
    graph
        .type_descriptor(module.raw_name())
        .is_none_or(|d| d.component_can_make_new_instances())
}

/// Which modules each component owns, as opposed to inheriting from an
/// ancestor. Inherited sets are memoized per component path for the duration
/// of one graph visit.
struct ModuleOwnership<'g> {
    graph: &'g BindingGraph,
    inherited: HashMap<ComponentPath, IndexSet<TypeName>>,
}

impl<'g> ModuleOwnership<'g> {
    fn new(graph: &'g BindingGraph) -> Self {
        ModuleOwnership {
            graph,
            inherited: HashMap::new(),
        }
    }

    fn component(&self, path: &ComponentPath) -> Result<&'g ComponentNode, ValidationError> {
        self.graph
            .component_node(path)
            .ok_or_else(|| ValidationError::UnknownComponent { path: path.to_string() })
    }

    /// The component's declared modules minus those inherited from ancestors.
    fn owned(&mut self, component: &ComponentNode) -> Result<IndexSet<TypeName>, ValidationError> {
        let inherited = self.inherited(&component.component_path)?;
        Ok(component
            .modules
            .iter()
            .filter(|m| !inherited.contains(*m))
            .cloned()
            .collect())
    }

    fn inherited(&mut self, path: &ComponentPath) -> Result<IndexSet<TypeName>, ValidationError> {
        if let Some(cached) = self.inherited.get(path) {
            return Ok(cached.clone());
        }
        let modules = if path.at_root() {
            IndexSet::new()
        } else {
            let parent = self.component(&path.parent()?)?;
            let mut modules = self.owned(parent)?;
            modules.extend(self.inherited(&parent.component_path)?);
            modules
        };
        self.inherited.insert(path.clone(), modules.clone());
        Ok(modules)
    }
}
