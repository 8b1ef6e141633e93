//! Error types shared across graph construction, option parsing and validation.
//!
//! User-facing validation problems are never errors: they are reported as
//! diagnostics. The types here cover malformed inputs (`GraphError`) and
//! internal invariant violations (`ValidationError`), which abort a round.

use thiserror::Error;

use crate::model::types::BindingKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Build,
    Options,
    Validate,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Build => write!(f, "Build"),
            Phase::Options => write!(f, "Options"),
            Phase::Validate => write!(f, "Validate"),
        }
    }
}

/// A problem with the graph description or the processor options, or an
/// internal error that aborted validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    /// The component the problem was found in, if applicable.
    pub component: Option<String>,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.component {
            Some(component) => write!(
                f,
                "[{}:{}] {} (component '{}')",
                self.phase, self.code, self.message, component
            ),
            None => write!(f, "[{}:{}] {}", self.phase, self.code, self.message),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<ValidationError> for GraphError {
    fn from(e: ValidationError) -> Self {
        let component = match &e {
            ValidationError::UnknownComponent { path } => Some(path.clone()),
            _ => None,
        };
        GraphError {
            code: "I001".into(),
            phase: Phase::Validate,
            message: e.to_string(),
            component,
        }
    }
}

impl GraphError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        GraphError {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
            component: None,
        }
    }

    pub fn build(code: &str, message: impl Into<String>, component: Option<String>) -> Self {
        GraphError {
            code: code.into(),
            phase: Phase::Build,
            message: message.into(),
            component,
        }
    }

    pub fn options(code: &str, message: impl Into<String>) -> Self {
        GraphError {
            code: code.into(),
            phase: Phase::Options,
            message: message.into(),
            component: None,
        }
    }
}

/// A type expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type '{input}': {reason} at offset {offset}")]
pub struct TypeNameError {
    pub input: String,
    pub reason: &'static str,
    pub offset: usize,
}

/// An internal invariant of the binding graph did not hold.
///
/// These indicate a defect in whatever built the graph, not a problem in the
/// user's bindings, and stop the current validation round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unexpected wildcard request: {key}")]
    WildcardKey { key: String },

    #[error("unexpected {kind:?} binding for {key} while {context}")]
    UnexpectedBindingKind {
        kind: BindingKind,
        key: String,
        context: &'static str,
    },

    #[error("map contribution {key} has no map key")]
    MissingMapKey { key: String },

    #[error("{key} requires a module instance but has no contributing module")]
    MissingContributingModule { key: String },

    #[error("delegate binding {key} must have exactly one dependency, found {found}")]
    DelegateDependencies { key: String, found: usize },

    #[error("binding {key} has no source element")]
    MissingBindingElement { key: String },

    #[error("root component path has no parent")]
    RootHasNoParent,

    #[error("component path is empty")]
    EmptyComponentPath,

    #[error("no component node for path {path}")]
    UnknownComponent { path: String },

    #[error("plugin '{plugin}' issued a mandatory warning, which cannot be aggregated")]
    MandatoryWarning { plugin: String },

    #[error("a diagnostic was reported before any plugin started")]
    NoCurrentPlugin,
}
