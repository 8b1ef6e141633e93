//! Reports set multibindings that receive the same `@Binds` target twice.

use indexmap::IndexMap;

use super::BindingGraphPlugin;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{Binding, BindingGraph, BindingKind, Key};

pub struct SetMultibindingValidator;

impl BindingGraphPlugin for SetMultibindingValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/SetMultibinding"
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        for binding in graph.bindings().filter(|b| b.kind == BindingKind::MultiboundSet) {
            check_for_duplicate_set_contributions(graph, binding, reporter)?;
        }
        Ok(())
    }
}

fn check_for_duplicate_set_contributions(
    graph: &BindingGraph,
    set: &Binding,
    reporter: &mut dyn DiagnosticReporter,
) -> Result<(), ValidationError> {
    let mut by_target: IndexMap<Key, Vec<&Binding>> = IndexMap::new();
    for contribution in graph.requested_bindings(set) {
        if contribution.kind == BindingKind::Delegate {
            let target = dereference_delegate(graph, contribution)?;
            by_target.entry(target).or_default().push(contribution);
        }
    }

    for (target, contributions) in by_target {
        if contributions.len() <= 1 {
            continue;
        }
        let component = graph.component_node(&set.component_path).ok_or_else(|| {
            ValidationError::UnknownComponent {
                path: set.component_path.to_string(),
            }
        })?;
        let declarations: Vec<String> = contributions.iter().map(|b| b.to_string()).collect();
        reporter.report_component_fmt(
            Severity::Error,
            component,
            format_args!(
                "Multiple set contributions into {} for the same contribution key: {}.\n\n    {}\n",
                set.key,
                target,
                declarations.join("\n    ")
            ),
        )?;
    }
    Ok(())
}

/// Follows a chain of delegate bindings to the key it finally resolves to.
fn dereference_delegate(graph: &BindingGraph, delegate: &Binding) -> Result<Key, ValidationError> {
    let mut visited: Vec<&Binding> = vec![delegate];
    let mut current = delegate;
    loop {
        let requested = graph.requested_bindings(current);
        let Some(&next) = requested.first() else {
            // The delegate's target is missing; use the key it asks for.
            return match current.dependencies.as_slice() {
                [only] => Ok(only.key.clone()),
                other => Err(ValidationError::DelegateDependencies {
                    key: current.key.to_string(),
                    found: other.len(),
                }),
            };
        };
        if next.kind != BindingKind::Delegate || visited.iter().any(|b| std::ptr::eq(*b, next)) {
            return Ok(next.key.clone());
        }
        visited.push(next);
        current = next;
    }
}
