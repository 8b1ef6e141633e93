//! Integration tests for duplicate binding detection.

#[allow(dead_code)]
mod helpers;

use bindgraph::diagnostics::{DiagnosticLocation, Severity};
use bindgraph::model::*;
use bindgraph::options::{ValidationOptions, ValidationType};
use helpers::*;

#[test]
fn same_component_duplicates_report_one_error() {
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M"))],
        vec![
            provides("Foo", "M", "provideFoo1", &["C"]),
            provides("Foo", "M", "provideFoo2", &["C"]),
        ],
    );
    let diagnostics = validate(&graph);
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    insta::assert_snapshot!(diagnostics[0].message, @r"
    Foo is bound multiple times:
        @Provides M.provideFoo1()
        @Provides M.provideFoo2()
    ");
    assert_eq!(
        diagnostics[0].location,
        DiagnosticLocation::Binding {
            path: "C".into(),
            key: "Foo".into(),
            declaration: "@Provides M.provideFoo1()".into(),
        }
    );
}

#[test]
fn bindings_copied_into_a_subcomponent_are_not_duplicates() {
    let graph = graph(
        vec![
            component(&["Root"]).with_module(ty("M")),
            component(&["Root", "Child"]),
        ],
        vec![
            provides("Foo", "M", "provideFoo", &["Root"]),
            provides("Foo", "M", "provideFoo", &["Root", "Child"]),
        ],
    );
    let diagnostics = validate(&graph);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn ancestor_and_descendant_declarations_conflict() {
    let graph = graph(
        vec![
            component(&["Root"]).with_module(ty("RootModule")),
            component(&["Root", "Child"]).with_module(ty("ChildModule")),
        ],
        vec![
            provides("Foo", "RootModule", "provideFoo", &["Root"]),
            provides("Foo", "ChildModule", "provideFoo", &["Root", "Child"]),
        ],
    );
    let diagnostics = validate(&graph);
    let errors = errors(&diagnostics);
    assert_eq!(errors.len(), 1, "{:?}", diagnostics);
    assert_eq!(
        errors[0].message,
        "Foo is bound multiple times:\n    @Provides RootModule.provideFoo()\n    @Provides ChildModule.provideFoo() [Root → Child]"
    );
}

#[test]
fn same_conflict_in_sibling_subcomponents_is_reported_once() {
    let graph = graph(
        vec![
            component(&["Root"]),
            component(&["Root", "A"]).with_module(ty("M1")).with_module(ty("M2")),
            component(&["Root", "B"]).with_module(ty("M1")).with_module(ty("M2")),
        ],
        vec![
            provides("Foo", "M1", "provideFoo", &["Root", "A"]),
            provides("Foo", "M2", "provideFoo", &["Root", "A"]),
            provides("Foo", "M1", "provideFoo", &["Root", "B"]),
            provides("Foo", "M2", "provideFoo", &["Root", "B"]),
        ],
    );
    let diagnostics = validate(&graph);
    assert_eq!(errors(&diagnostics).len(), 1, "{:?}", diagnostics);
}

#[test]
fn different_keys_do_not_conflict() {
    let graph = graph(
        vec![component(&["C"])],
        vec![
            provides("Foo", "M", "provideFoo", &["C"]),
            provides_key(Key::qualified("@Named(\"other\")", ty("Foo")), "M", "provideOtherFoo", &["C"]),
        ],
    );
    assert!(validate(&graph).is_empty());
}

fn explicit_and_inject() -> BindingGraph {
    graph(
        vec![component(&["C"]).with_module(ty("M"))],
        vec![
            inject("Foo", &[], &["C"]),
            provides("Foo", "M", "provideFoo", &["C"]),
        ],
    )
}

#[test]
fn explicit_binding_conflicting_with_inject_warns_by_default() {
    let diagnostics = validate(&explicit_and_inject());
    assert!(errors(&diagnostics).is_empty(), "{:?}", diagnostics);
    let warnings = warnings(&diagnostics);
    assert_eq!(warnings.len(), 1);
    insta::assert_snapshot!(warnings[0].message, @r"
    Foo is bound multiple times:
        @Inject Foo()
        @Provides M.provideFoo()
    This condition was never validated before, and will soon be an error.
    ");
    assert!(matches!(
        &warnings[0].location,
        DiagnosticLocation::Binding { declaration, .. } if declaration == "@Provides M.provideFoo()"
    ));
}

#[test]
fn explicit_binding_conflict_severity_is_configurable() {
    let graph = explicit_and_inject();

    let off = ValidationOptions {
        explicit_binding_conflicts_with_inject: ValidationType::None,
        ..Default::default()
    };
    assert!(validate_with(&graph, &off).is_empty());

    let strict = ValidationOptions {
        explicit_binding_conflicts_with_inject: ValidationType::Error,
        ..Default::default()
    };
    let diagnostics = validate_with(&graph, &strict);
    assert_eq!(errors(&diagnostics).len(), 1, "{:?}", diagnostics);
}

#[test]
fn one_inject_binding_against_several_explicit_bindings_is_an_inject_conflict() {
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M"))],
        vec![
            inject("Foo", &[], &["C"]),
            provides("Foo", "M", "provideFoo", &["C"]),
            provides("Foo", "M", "provideFoo2", &["C"]),
        ],
    );
    let diagnostics = validate(&graph);
    assert_eq!(warnings(&diagnostics).len(), 1, "{:?}", diagnostics);
    assert!(errors(&diagnostics).is_empty());
}

#[test]
fn multibinding_and_unique_binding_are_incompatible() {
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M"))],
        vec![
            Binding::new(key("Set<Foo>"), BindingKind::MultiboundSet, path(&["C"])),
            provides("Set<Foo>", "M", "provideFoos", &["C"]),
        ],
    );
    let diagnostics = validate(&graph);
    let errors = errors(&diagnostics);
    assert_eq!(errors.len(), 1, "{:?}", diagnostics);
    assert!(errors[0].message.starts_with("Set<Foo> has incompatible bindings or declarations:"));
    assert!(errors[0].message.contains("Set bindings and declarations:\n        Set<Foo> (multibound set)"));
    assert!(errors[0].message.contains("Unique bindings and declarations:\n        @Provides M.provideFoos()"));
}

#[test]
fn experimental_messages_report_on_the_root_component() {
    let graph = graph(
        vec![component(&["C"]).with_module(ty("M"))],
        vec![
            provides("Foo", "M", "provideFoo1", &["C"]),
            provides("Foo", "M", "provideFoo2", &["C"]),
        ],
    );
    let diagnostics = validate_with(&graph, &experimental());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].location, component_location("C"));
    assert!(diagnostics[0].message.starts_with("[Dagger/DuplicateBindings] Foo is bound multiple times:"));
}
