//! Validation options.
//!
//! Options arrive either as JSON (camelCase keys) or as annotation-processor
//! `-A` style key/value pairs, optionally prefixed with `dagger.`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Severity;
use crate::error::GraphError;

pub const EXPERIMENTAL_ERROR_MESSAGES: &str = "experimentalDaggerErrorMessages";
pub const NULLABLE_VALIDATION: &str = "nullableValidation";
pub const MODULE_HAS_DIFFERENT_SCOPES_VALIDATION: &str = "moduleHasDifferentScopesValidation";
pub const EXPLICIT_BINDING_CONFLICTS_WITH_INJECT: &str = "explicitBindingConflictsWithInject";
pub const FULL_BINDING_GRAPH_VALIDATION: &str = "fullBindingGraphValidation";

const OPTION_PREFIX: &str = "dagger.";

/// A check that can report either an error or a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    #[default]
    Error,
    Warning,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::Error => Severity::Error,
            DiagnosticKind::Warning => Severity::Warning,
        }
    }

    fn parse(option: &str, value: &str) -> Result<Self, GraphError> {
        match value.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(DiagnosticKind::Error),
            "WARNING" => Ok(DiagnosticKind::Warning),
            _ => Err(invalid_value(option, value, "ERROR, WARNING")),
        }
    }
}

/// A check that can also be turned off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationType {
    Error,
    Warning,
    None,
}

impl ValidationType {
    /// `None` when the check is disabled.
    pub fn severity(self) -> Option<Severity> {
        match self {
            ValidationType::Error => Some(Severity::Error),
            ValidationType::Warning => Some(Severity::Warning),
            ValidationType::None => None,
        }
    }

    fn parse(option: &str, value: &str) -> Result<Self, GraphError> {
        match value.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(ValidationType::Error),
            "WARNING" => Ok(ValidationType::Warning),
            "NONE" => Ok(ValidationType::None),
            _ => Err(invalid_value(option, value, "ERROR, WARNING, NONE")),
        }
    }
}

fn invalid_value(option: &str, value: &str, expected: &str) -> GraphError {
    GraphError::options(
        "O002",
        format!("Invalid value '{value}' for option '{option}', expected one of {expected}"),
    )
}

fn default_explicit_binding_conflicts() -> ValidationType {
    ValidationType::Warning
}

fn default_full_binding_graph_validation() -> ValidationType {
    ValidationType::None
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationOptions {
    /// Fold every plugin's diagnostics into one message per root component.
    pub experimental_dagger_error_messages: bool,
    pub nullable_validation: DiagnosticKind,
    pub module_has_different_scopes_validation: DiagnosticKind,
    #[serde(default = "default_explicit_binding_conflicts")]
    pub explicit_binding_conflicts_with_inject: ValidationType,
    /// Recorded only; each graph says whether it is a full binding graph.
    #[serde(default = "default_full_binding_graph_validation")]
    pub full_binding_graph_validation: ValidationType,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            experimental_dagger_error_messages: false,
            nullable_validation: DiagnosticKind::Error,
            module_has_different_scopes_validation: DiagnosticKind::Error,
            explicit_binding_conflicts_with_inject: default_explicit_binding_conflicts(),
            full_binding_graph_validation: default_full_binding_graph_validation(),
        }
    }
}

impl ValidationOptions {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| {
            GraphError::options("O001", format!("Failed to parse validation options JSON: {}", e))
        })
    }

    /// Reads processor options. Keys this crate does not know are ignored.
    pub fn from_processor_options(options: &BTreeMap<String, String>) -> Result<Self, GraphError> {
        let mut parsed = ValidationOptions::default();
        for (key, value) in options {
            let name = key.strip_prefix(OPTION_PREFIX).unwrap_or(key);
            match name {
                EXPERIMENTAL_ERROR_MESSAGES => {
                    parsed.experimental_dagger_error_messages = match value.to_ascii_lowercase().as_str() {
                        "true" | "enabled" => true,
                        "false" | "disabled" => false,
                        _ => return Err(invalid_value(name, value, "true, false, enabled, disabled")),
                    };
                }
                NULLABLE_VALIDATION => {
                    parsed.nullable_validation = DiagnosticKind::parse(name, value)?;
                }
                MODULE_HAS_DIFFERENT_SCOPES_VALIDATION => {
                    parsed.module_has_different_scopes_validation = DiagnosticKind::parse(name, value)?;
                }
                EXPLICIT_BINDING_CONFLICTS_WITH_INJECT => {
                    parsed.explicit_binding_conflicts_with_inject = ValidationType::parse(name, value)?;
                }
                FULL_BINDING_GRAPH_VALIDATION => {
                    parsed.full_binding_graph_validation = ValidationType::parse(name, value)?;
                }
                _ => {}
            }
        }
        Ok(parsed)
    }
}
