//! Diagnostic reporting.
//!
//! Validators never return user-facing problems as errors. They call a
//! [`DiagnosticReporter`] with a severity, a graph location and a message.

pub mod format;
pub mod writer;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{Binding, ChildFactoryMethodEdge, ComponentNode, DependencyEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    MandatoryWarning,
    Note,
    Other,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::MandatoryWarning => write!(f, "mandatory warning"),
            Severity::Note => write!(f, "note"),
            Severity::Other => write!(f, "other"),
        }
    }
}

/// Where in the graph a diagnostic is reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DiagnosticLocation {
    Component {
        path: String,
    },
    Binding {
        path: String,
        key: String,
        declaration: String,
    },
    Dependency {
        path: String,
        key: String,
        entry_point: bool,
    },
    SubcomponentFactoryMethod {
        path: String,
        method: String,
    },
}

impl fmt::Display for DiagnosticLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLocation::Component { path } => write!(f, "[{path}]"),
            DiagnosticLocation::Binding {
                path, declaration, ..
            } => write!(f, "[{path}] {declaration}"),
            DiagnosticLocation::Dependency { path, key, .. } => {
                write!(f, "[{path}] request for {key}")
            }
            DiagnosticLocation::SubcomponentFactoryMethod { path, method } => {
                write!(f, "[{path}] {method}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: DiagnosticLocation,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.severity, self.location, self.message)
    }
}

/// Sink for validation diagnostics.
///
/// Methods return an error only for internal invariant violations, e.g. an
/// aggregating reporter receiving a severity it cannot merge.
pub trait DiagnosticReporter {
    fn report_component(
        &mut self,
        severity: Severity,
        component: &ComponentNode,
        message: &str,
    ) -> Result<(), ValidationError>;

    fn report_binding(
        &mut self,
        severity: Severity,
        binding: &Binding,
        message: &str,
    ) -> Result<(), ValidationError>;

    fn report_dependency(
        &mut self,
        severity: Severity,
        edge: &DependencyEdge,
        message: &str,
    ) -> Result<(), ValidationError>;

    fn report_subcomponent_factory_method(
        &mut self,
        severity: Severity,
        edge: &ChildFactoryMethodEdge,
        message: &str,
    ) -> Result<(), ValidationError>;

    fn report_component_fmt(
        &mut self,
        severity: Severity,
        component: &ComponentNode,
        args: fmt::Arguments<'_>,
    ) -> Result<(), ValidationError> {
        self.report_component(severity, component, &args.to_string())
    }

    fn report_binding_fmt(
        &mut self,
        severity: Severity,
        binding: &Binding,
        args: fmt::Arguments<'_>,
    ) -> Result<(), ValidationError> {
        self.report_binding(severity, binding, &args.to_string())
    }

    fn report_dependency_fmt(
        &mut self,
        severity: Severity,
        edge: &DependencyEdge,
        args: fmt::Arguments<'_>,
    ) -> Result<(), ValidationError> {
        self.report_dependency(severity, edge, &args.to_string())
    }

    fn report_subcomponent_factory_method_fmt(
        &mut self,
        severity: Severity,
        edge: &ChildFactoryMethodEdge,
        args: fmt::Arguments<'_>,
    ) -> Result<(), ValidationError> {
        self.report_subcomponent_factory_method(severity, edge, &args.to_string())
    }
}

/// Reporter that keeps every diagnostic in report order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// The build fails if any error was reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, location: DiagnosticLocation, message: &str) {
        self.diagnostics.push(Diagnostic {
            severity,
            location,
            message: message.to_string(),
        });
    }
}

impl DiagnosticReporter for CollectingReporter {
    fn report_component(
        &mut self,
        severity: Severity,
        component: &ComponentNode,
        message: &str,
    ) -> Result<(), ValidationError> {
        let location = DiagnosticLocation::Component {
            path: component.component_path.to_string(),
        };
        self.push(severity, location, message);
        Ok(())
    }

    fn report_binding(
        &mut self,
        severity: Severity,
        binding: &Binding,
        message: &str,
    ) -> Result<(), ValidationError> {
        let location = DiagnosticLocation::Binding {
            path: binding.component_path.to_string(),
            key: binding.key.to_string(),
            declaration: binding.to_string(),
        };
        self.push(severity, location, message);
        Ok(())
    }

    fn report_dependency(
        &mut self,
        severity: Severity,
        edge: &DependencyEdge,
        message: &str,
    ) -> Result<(), ValidationError> {
        let location = DiagnosticLocation::Dependency {
            path: edge.component_path.to_string(),
            key: edge.request.key.to_string(),
            entry_point: edge.entry_point,
        };
        self.push(severity, location, message);
        Ok(())
    }

    fn report_subcomponent_factory_method(
        &mut self,
        severity: Severity,
        edge: &ChildFactoryMethodEdge,
        message: &str,
    ) -> Result<(), ValidationError> {
        let location = DiagnosticLocation::SubcomponentFactoryMethod {
            path: edge.parent.to_string(),
            method: edge.factory_method.to_string(),
        };
        self.push(severity, location, message);
        Ok(())
    }
}
