//! WASM entry points for browser use.

use wasm_bindgen::prelude::*;

use crate::diagnostics::{Diagnostic, Severity};
use crate::error::GraphError;
use crate::options::ValidationOptions;

/// Validate a binding graph description against JSON validation options.
/// Returns `{ status: "ok", diagnostics }` or `{ status: "errors", errors }`.
#[wasm_bindgen]
pub fn validate_binding_graph(graph_json: &str, options_json: &str) -> JsValue {
    let result = validate_binding_graph_inner(graph_json, options_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

/// Parse, build and validate. Pure Rust; the WASM wrapper only serializes.
pub fn validate_binding_graph_inner(graph_json: &str, options_json: &str) -> ValidationResult {
    let options = if options_json.trim().is_empty() {
        ValidationOptions::default()
    } else {
        match ValidationOptions::from_json(options_json) {
            Ok(o) => o,
            Err(e) => return ValidationResult::errors(vec![e]),
        }
    };

    let graph = match crate::model::parse_and_build(graph_json) {
        Ok(g) => g,
        Err(errors) => return ValidationResult::errors(errors),
    };

    match crate::validate::validate_graph(&graph, &options) {
        Ok(diagnostics) => ValidationResult::Ok {
            has_errors: diagnostics.iter().any(|d| d.severity == Severity::Error),
            diagnostics,
        },
        Err(e) => ValidationResult::errors(vec![e.into()]),
    }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorDto {
    pub code: String,
    pub phase: String,
    pub message: String,
    pub component: Option<String>,
}

impl From<GraphError> for ErrorDto {
    fn from(e: GraphError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            component: e.component,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
pub enum ValidationResult {
    #[serde(rename = "ok")]
    Ok {
        #[serde(rename = "hasErrors")]
        has_errors: bool,
        diagnostics: Vec<Diagnostic>,
    },
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}

impl ValidationResult {
    fn errors(errors: Vec<GraphError>) -> Self {
        ValidationResult::Errors {
            errors: errors.into_iter().map(ErrorDto::from).collect(),
        }
    }
}
