//! Binding graph validation.
//!
//! Each check is an independent [`BindingGraphPlugin`] that walks the graph
//! and reports diagnostics. The registry orders the plugins and optionally
//! folds them into one [`CompositeBindingGraphPlugin`].

pub mod composite;
pub mod dependency_cycle;
pub mod duplicate_bindings;
pub mod incompatibly_scoped;
pub mod inject_binding;
pub mod map_multibinding;
pub mod missing_binding;
pub mod nullable_binding;
pub mod set_multibinding;
pub mod subcomponent_factory_method;

use std::collections::BTreeSet;

use tracing::{debug, debug_span};

use crate::diagnostics::{CollectingReporter, Diagnostic, DiagnosticReporter};
use crate::error::ValidationError;
use crate::model::BindingGraph;
use crate::options::ValidationOptions;

pub use composite::CompositeBindingGraphPlugin;
pub use dependency_cycle::DependencyCycleValidator;
pub use duplicate_bindings::DuplicateBindingsValidator;
pub use incompatibly_scoped::IncompatiblyScopedBindingsValidator;
pub use inject_binding::{InjectBindingValidator, InjectConstructorRules, InjectValidator, ValidationItem};
pub use map_multibinding::MapMultibindingValidator;
pub use missing_binding::MissingBindingValidator;
pub use nullable_binding::NullableBindingValidator;
pub use set_multibinding::SetMultibindingValidator;
pub use subcomponent_factory_method::SubcomponentFactoryMethodValidator;

/// One validation pass over a binding graph.
///
/// `visit_graph` reports problems through `reporter` and never mutates the
/// graph. It returns an error only when the graph breaks an invariant that
/// graph construction should have guaranteed.
pub trait BindingGraphPlugin {
    /// Stable name, used as a message prefix by the composite plugin.
    fn plugin_name(&self) -> &str;

    /// Option keys this plugin reads.
    fn supported_options(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn init(&mut self, _options: &ValidationOptions) {}

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError>;

    fn on_plugin_end(&mut self) {}
}

/// The validation plugins in the order they run, wrapped in a composite when
/// aggregated messages are enabled.
pub fn validation_plugins(options: &ValidationOptions) -> Vec<Box<dyn BindingGraphPlugin>> {
    let plugins: Vec<Box<dyn BindingGraphPlugin>> = vec![
        Box::new(DependencyCycleValidator),
        Box::new(DuplicateBindingsValidator::default()),
        Box::new(IncompatiblyScopedBindingsValidator::default()),
        Box::new(InjectBindingValidator::default()),
        Box::new(MapMultibindingValidator),
        Box::new(MissingBindingValidator),
        Box::new(NullableBindingValidator::default()),
        Box::new(SetMultibindingValidator),
        Box::new(SubcomponentFactoryMethodValidator),
    ];
    if options.experimental_dagger_error_messages {
        vec![Box::new(CompositeBindingGraphPlugin::new(plugins))]
    } else {
        plugins
    }
}

/// Runs every plugin to completion. Stops only on an internal error.
pub fn run_plugins(
    plugins: &mut [Box<dyn BindingGraphPlugin>],
    graph: &BindingGraph,
    reporter: &mut dyn DiagnosticReporter,
) -> Result<(), ValidationError> {
    for plugin in plugins.iter() {
        let span = debug_span!("plugin", name = plugin.plugin_name());
        let _entered = span.enter();
        plugin.visit_graph(graph, reporter)?;
    }
    for plugin in plugins.iter_mut() {
        plugin.on_plugin_end();
    }
    Ok(())
}

/// Validates `graph` with the configured plugins and returns every diagnostic
/// in report order.
pub fn validate_graph(
    graph: &BindingGraph,
    options: &ValidationOptions,
) -> Result<Vec<Diagnostic>, ValidationError> {
    let mut plugins = validation_plugins(options);
    for plugin in plugins.iter_mut() {
        plugin.init(options);
    }

    let mut reporter = CollectingReporter::new();
    run_plugins(&mut plugins, graph, &mut reporter)?;

    debug!(
        plugins = plugins.len(),
        diagnostics = reporter.diagnostics().len(),
        errors = reporter.has_errors(),
        "validated binding graph"
    );
    Ok(reporter.into_diagnostics())
}
