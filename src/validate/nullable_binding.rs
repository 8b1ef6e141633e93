//! Reports nullable bindings injected into sites that do not accept null.

use std::collections::BTreeSet;

use super::BindingGraphPlugin;
use crate::diagnostics::DiagnosticReporter;
use crate::error::ValidationError;
use crate::model::{Binding, BindingGraph, RequestKind};
use crate::options::{DiagnosticKind, NULLABLE_VALIDATION, ValidationOptions};

#[derive(Default)]
pub struct NullableBindingValidator {
    kind: DiagnosticKind,
}

impl BindingGraphPlugin for NullableBindingValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/Nullable"
    }

    fn supported_options(&self) -> BTreeSet<String> {
        BTreeSet::from([NULLABLE_VALIDATION.to_string()])
    }

    fn init(&mut self, options: &ValidationOptions) {
        self.kind = options.nullable_validation;
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        for binding in graph.bindings().filter(|b| b.nullable) {
            // Framework wrappers such as Provider<T> may hand out null.
            let non_nullable = graph
                .in_dependency_edges(binding)
                .into_iter()
                .filter(|e| e.edge.request.kind == RequestKind::Instance && !e.edge.request.nullable_allowed);
            for edge in non_nullable {
                reporter.report_dependency(self.kind.severity(), edge.edge, &nullable_to_non_nullable(binding))?;
            }
        }
        Ok(())
    }
}

fn nullable_to_non_nullable(binding: &Binding) -> String {
    format!("{} is not nullable, but is being provided by {}", binding.key, binding)
}
