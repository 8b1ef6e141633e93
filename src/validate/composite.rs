//! Runs several plugins and folds their diagnostics into one message on the
//! root component.

use std::collections::BTreeSet;

use super::BindingGraphPlugin;
use crate::diagnostics::format::{binding_trace, component_path_unless_at_root, dependency_edge_trace};
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{Binding, BindingGraph, ChildFactoryMethodEdge, ComponentNode, DependencyEdge};
use crate::options::ValidationOptions;

pub struct CompositeBindingGraphPlugin {
    plugins: Vec<Box<dyn BindingGraphPlugin>>,
}

impl CompositeBindingGraphPlugin {
    pub fn new(plugins: Vec<Box<dyn BindingGraphPlugin>>) -> Self {
        CompositeBindingGraphPlugin { plugins }
    }
}

impl BindingGraphPlugin for CompositeBindingGraphPlugin {
    fn plugin_name(&self) -> &str {
        "Dagger/Validation"
    }

    fn supported_options(&self) -> BTreeSet<String> {
        self.plugins
            .iter()
            .flat_map(|p| p.supported_options())
            .collect()
    }

    fn init(&mut self, options: &ValidationOptions) {
        for plugin in &mut self.plugins {
            plugin.init(options);
        }
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        let mut aggregating = AggregatingReporter::new(&mut *reporter, graph);
        for plugin in &self.plugins {
            aggregating.current_plugin = Some(plugin.plugin_name().to_string());
            plugin.visit_graph(graph, &mut aggregating)?;
        }
        if let Some(report) = aggregating.finish() {
            reporter.report_component(report.severity, graph.root_component_node(), &report.message)?;
        }
        Ok(())
    }

    fn on_plugin_end(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_plugin_end();
        }
    }
}

/// The merged result of one composite visit.
struct AggregatedReport {
    severity: Severity,
    message: String,
}

/// Buffers every message reported by the wrapped plugins.
///
/// Factory-method diagnostics whose method is declared inside the root
/// component pass straight through, since their location is already precise.
struct AggregatingReporter<'r, 'g> {
    delegate: &'r mut dyn DiagnosticReporter,
    graph: &'g BindingGraph,
    message: String,
    severity: Option<Severity>,
    current_plugin: Option<String>,
}

impl<'r, 'g> AggregatingReporter<'r, 'g> {
    fn new(delegate: &'r mut dyn DiagnosticReporter, graph: &'g BindingGraph) -> Self {
        AggregatingReporter {
            delegate,
            graph,
            message: String::new(),
            severity: None,
            current_plugin: None,
        }
    }

    fn add_message(&mut self, severity: Severity, message: &str) -> Result<(), ValidationError> {
        let plugin = self.current_plugin.as_deref().ok_or(ValidationError::NoCurrentPlugin)?;
        if severity == Severity::MandatoryWarning {
            return Err(ValidationError::MandatoryWarning {
                plugin: plugin.to_string(),
            });
        }
        if self.severity.is_some() {
            self.message.push_str("\n\n");
        }
        self.message.push_str(&format!("[{plugin}] {message}"));
        self.severity = Some(merge_severity(self.severity, severity));
        Ok(())
    }

    fn finish(self) -> Option<AggregatedReport> {
        let severity = self.severity?;
        Some(AggregatedReport {
            severity,
            message: self.message,
        })
    }
}

/// Error > Warning > Note > Other.
fn merge_severity(current: Option<Severity>, new: Severity) -> Severity {
    fn rank(severity: Severity) -> u8 {
        match severity {
            Severity::Error => 3,
            Severity::Warning | Severity::MandatoryWarning => 2,
            Severity::Note => 1,
            Severity::Other => 0,
        }
    }
    match current {
        Some(current) if rank(current) >= rank(new) => current,
        _ => new,
    }
}

impl DiagnosticReporter for AggregatingReporter<'_, '_> {
    fn report_component(
        &mut self,
        severity: Severity,
        component: &ComponentNode,
        message: &str,
    ) -> Result<(), ValidationError> {
        let path = component_path_unless_at_root(&component.component_path);
        self.add_message(severity, &format!("{message}{path}"))
    }

    fn report_binding(
        &mut self,
        severity: Severity,
        binding: &Binding,
        message: &str,
    ) -> Result<(), ValidationError> {
        let trace = binding_trace(self.graph, binding);
        self.add_message(severity, &format!("{message}{trace}"))
    }

    fn report_dependency(
        &mut self,
        severity: Severity,
        edge: &DependencyEdge,
        message: &str,
    ) -> Result<(), ValidationError> {
        let trace = dependency_edge_trace(self.graph, edge);
        self.add_message(severity, &format!("{message}{trace}"))
    }

    fn report_subcomponent_factory_method(
        &mut self,
        severity: Severity,
        edge: &ChildFactoryMethodEdge,
        message: &str,
    ) -> Result<(), ValidationError> {
        let root = self.graph.root_component_node().component_path.current_component();
        if edge.factory_method.is_enclosed_by(root) {
            return self.delegate.report_subcomponent_factory_method(severity, edge, message);
        }
        self.add_message(severity, &format!("[{}] {message}", edge.factory_method))
    }
}
