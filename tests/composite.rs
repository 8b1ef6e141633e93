//! Integration tests for aggregated diagnostics under experimental messages.

#[allow(dead_code)]
mod helpers;

use bindgraph::diagnostics::{CollectingReporter, DiagnosticLocation, DiagnosticReporter, Severity};
use bindgraph::error::ValidationError;
use bindgraph::model::*;
use bindgraph::options::{
    EXPERIMENTAL_ERROR_MESSAGES, EXPLICIT_BINDING_CONFLICTS_WITH_INJECT, MODULE_HAS_DIFFERENT_SCOPES_VALIDATION,
    NULLABLE_VALIDATION, ValidationOptions,
};
use bindgraph::validate::{BindingGraphPlugin, CompositeBindingGraphPlugin, validation_plugins};
use helpers::*;

#[test]
fn diagnostics_from_several_plugins_become_one_message() {
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M")).with_entry_point(request("Bar"))],
        vec![
            provides("Foo", "M", "provideFoo1", &["C"]),
            provides("Foo", "M", "provideFoo2", &["C"]),
        ],
    );
    let diagnostics = validate_with(&graph, &experimental());
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].location, component_location("C"));
    insta::assert_snapshot!(diagnostics[0].message, @r"
    [Dagger/DuplicateBindings] Foo is bound multiple times:
        @Provides M.provideFoo1()
        @Provides M.provideFoo2()

    [Dagger/MissingBinding] Bar cannot be provided without an @Inject constructor or a @Provides-annotated method.
        Bar is requested at
            [C] C
    ");
}

#[test]
fn warnings_alone_merge_to_a_warning() {
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M"))],
        vec![inject("Foo", &[], &["C"]), provides("Foo", "M", "provideFoo", &["C"])],
    );
    let diagnostics = validate_with(&graph, &experimental());
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert!(diagnostics[0]
        .message
        .starts_with("[Dagger/DuplicateBindings] Foo is bound multiple times:\n    @Inject Foo()"));
}

#[test]
fn clean_graph_reports_nothing() {
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M")).with_entry_point(request("Foo"))],
        vec![provides("Foo", "M", "provideFoo", &["C"])],
    );
    assert!(validate_with(&graph, &experimental()).is_empty());
}

#[test]
fn component_messages_below_the_root_name_their_path() {
    let graph = graph(
        vec![component(&["Root"]), component(&["Root", "Child"]).with_entry_point(request("Foo"))],
        vec![],
    );
    let diagnostics = validate_with(&graph, &experimental());
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].location, component_location("Root"));
    assert_eq!(
        diagnostics[0].message,
        "[Dagger/MissingBinding] Foo cannot be provided without an @Inject constructor or a @Provides-annotated method.\n    Foo is requested at\n        [Root → Child] Child\n    component path: Root → Child"
    );
}

#[test]
fn binding_messages_carry_their_request_trace() {
    let map = "Map<String, Foo>";
    let contribution = |method: &str| {
        provides_key(key(map).with_contribution(format!("M#{method}")), "M", method, &["C"]).with_map_key(string_key("a"))
    };
    let map_binding = Binding::new(key(map), BindingKind::MultiboundMap, path(&["C"]))
        .with_dependency(DependencyRequest::instance(key(map).with_contribution("M#provide1")))
        .with_dependency(DependencyRequest::instance(key(map).with_contribution("M#provide2")));
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M")).with_entry_point(request(map))],
        vec![map_binding, contribution("provide1"), contribution("provide2")],
    );
    let diagnostics = validate_with(&graph, &experimental());
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(
        diagnostics[0]
            .message
            .ends_with("M.provide2()\n    Map<String, Foo> is requested at\n        [C] C"),
        "{}",
        diagnostics[0].message
    );
}

// =============================================================================
// Subcomponent factory methods
// =============================================================================

fn needs_args() -> TypeDescriptor {
    TypeDescriptor::class(ty("NeedsArgs")).with_constructor(ConstructorDescriptor {
        parameters: vec![ty("String")],
        ..Default::default()
    })
}

#[test]
fn factory_methods_on_the_root_keep_their_location() {
    let child = component(&["Parent", "Child"])
        .with_module(ty("NeedsArgs"))
        .with_factory_method(SourceElement::method(ty("Parent"), "child", vec![]));
    let graph = graph_with_types(
        vec![component(&["Parent"]), child],
        vec![provides("Foo", "NeedsArgs", "provideFoo", &["Parent", "Child"]).requiring_module_instance()],
        vec![needs_args()],
    );
    let diagnostics = validate_with(&graph, &experimental());
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(
        diagnostics[0].location,
        DiagnosticLocation::SubcomponentFactoryMethod {
            path: "Parent".into(),
            method: "Parent.child()".into(),
        }
    );
    assert!(diagnostics[0].message.starts_with("Child requires modules"));
}

#[test]
fn factory_methods_declared_elsewhere_are_aggregated() {
    let child = component(&["Parent", "Child"])
        .with_factory_method(SourceElement::method(ty("Parent"), "child", vec![]));
    let grandchild = component(&["Parent", "Child", "Grandchild"])
        .with_module(ty("NeedsArgs"))
        .with_factory_method(SourceElement::method(ty("Child"), "grandchild", vec![]));
    let graph = graph_with_types(
        vec![component(&["Parent"]), child, grandchild],
        vec![provides("Foo", "NeedsArgs", "provideFoo", &["Parent", "Child", "Grandchild"]).requiring_module_instance()],
        vec![needs_args()],
    );
    let diagnostics = validate_with(&graph, &experimental());
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].location, component_location("Parent"));
    assert_eq!(
        diagnostics[0].message,
        "[Dagger/SubcomponentFactoryMethodMissingModule] [Child.grandchild()] Grandchild requires modules which have no visible default constructors. Add the following modules as parameters to this method: NeedsArgs"
    );
}

// =============================================================================
// Plugin contract
// =============================================================================

#[test]
fn composite_supports_the_union_of_plugin_options() {
    let composite = CompositeBindingGraphPlugin::new(validation_plugins(&ValidationOptions::default()));
    let options = composite.supported_options();
    for option in [
        EXPERIMENTAL_ERROR_MESSAGES,
        EXPLICIT_BINDING_CONFLICTS_WITH_INJECT,
        MODULE_HAS_DIFFERENT_SCOPES_VALIDATION,
        NULLABLE_VALIDATION,
    ] {
        assert!(options.contains(option), "{option} missing from {:?}", options);
    }
    assert_eq!(composite.plugin_name(), "Dagger/Validation");
}

#[test]
fn experimental_options_wrap_every_plugin() {
    let plugins = validation_plugins(&experimental());
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].plugin_name(), "Dagger/Validation");
    assert_eq!(validation_plugins(&ValidationOptions::default()).len(), 9);
}

struct ReportingPlugin {
    severity: Severity,
}

impl BindingGraphPlugin for ReportingPlugin {
    fn plugin_name(&self) -> &str {
        "test/Reporting"
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        reporter.report_component(self.severity, graph.root_component_node(), "something happened")
    }
}

fn visit_with(plugins: Vec<Box<dyn BindingGraphPlugin>>) -> Result<CollectingReporter, ValidationError> {
    let graph = graph(vec![component(&["C"])], vec![]);
    let composite = CompositeBindingGraphPlugin::new(plugins);
    let mut reporter = CollectingReporter::new();
    composite.visit_graph(&graph, &mut reporter)?;
    Ok(reporter)
}

#[test]
fn notes_and_warnings_merge_to_the_strongest() {
    let reporter = visit_with(vec![
        Box::new(ReportingPlugin { severity: Severity::Note }),
        Box::new(ReportingPlugin { severity: Severity::Warning }),
    ])
    .expect("no internal errors");
    let diagnostics = reporter.into_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(
        diagnostics[0].message,
        "[test/Reporting] something happened\n\n[test/Reporting] something happened"
    );
}

#[test]
fn mandatory_warnings_are_rejected() {
    let result = visit_with(vec![Box::new(ReportingPlugin {
        severity: Severity::MandatoryWarning,
    })]);
    assert!(
        matches!(&result, Err(ValidationError::MandatoryWarning { plugin }) if plugin == "test/Reporting"),
        "{:?}",
        result.err()
    );
}
