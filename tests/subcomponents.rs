//! Integration tests for subcomponent factory methods and their modules.

#[allow(dead_code)]
mod helpers;

use bindgraph::diagnostics::{DiagnosticLocation, Severity};
use bindgraph::model::*;
use helpers::*;

fn needs_args() -> TypeDescriptor {
    TypeDescriptor::class(ty("NeedsArgs")).with_constructor(ConstructorDescriptor {
        parameters: vec![ty("String")],
        ..Default::default()
    })
}

fn child_with(module: &str, at: &[&str], factory_parameters: Vec<TypeName>) -> (ComponentNode, Binding) {
    let parent = at[at.len() - 2];
    let child = component(at)
        .with_module(ty(module))
        .with_factory_method(SourceElement::method(ty(parent), "child", factory_parameters));
    let binding = provides("Foo", module, "provideFoo", at).requiring_module_instance();
    (child, binding)
}

#[test]
fn factory_method_missing_a_module_that_needs_arguments() {
    let (child, binding) = child_with("NeedsArgs", &["Parent", "Child"], vec![]);
    let graph = graph_with_types(vec![component(&["Parent"]), child], vec![binding], vec![needs_args()]);
    let diagnostics = validate(&graph);
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(
        diagnostics[0].location,
        DiagnosticLocation::SubcomponentFactoryMethod {
            path: "Parent".into(),
            method: "Parent.child()".into(),
        }
    );
    insta::assert_snapshot!(diagnostics[0].message, @"Child requires modules which have no visible default constructors. Add the following modules as parameters to this method: NeedsArgs");
}

#[test]
fn module_passed_to_the_factory_method_is_fine() {
    let (child, binding) = child_with("NeedsArgs", &["Parent", "Child"], vec![ty("NeedsArgs")]);
    let graph = graph_with_types(vec![component(&["Parent"]), child], vec![binding], vec![needs_args()]);
    assert!(validate(&graph).is_empty());
}

#[test]
fn module_with_a_default_constructor_is_fine() {
    let (child, binding) = child_with("DefaultModule", &["Parent", "Child"], vec![]);
    let graph = graph_with_types(
        vec![component(&["Parent"]), child],
        vec![binding],
        vec![TypeDescriptor::class(ty("DefaultModule"))],
    );
    assert!(validate(&graph).is_empty());
}

#[test]
fn undescribed_modules_are_assumed_instantiable() {
    let (child, binding) = child_with("Unknown", &["Parent", "Child"], vec![]);
    let graph = graph(vec![component(&["Parent"]), child], vec![binding]);
    assert!(validate(&graph).is_empty());
}

#[test]
fn module_inherited_from_the_parent_is_not_required() {
    let (child, binding) = child_with("NeedsArgs", &["Parent", "Child"], vec![]);
    let graph = graph_with_types(
        vec![component(&["Parent"]).with_module(ty("NeedsArgs")), child],
        vec![binding],
        vec![needs_args()],
    );
    assert!(validate(&graph).is_empty());
}

#[test]
fn grandchild_modules_are_checked_against_every_ancestor() {
    let child = component(&["Parent", "Child"])
        .with_module(ty("Other"))
        .with_factory_method(SourceElement::method(ty("Parent"), "child", vec![]));
    let (grandchild, binding) = child_with("NeedsArgs", &["Parent", "Child", "Grandchild"], vec![]);
    let graph = graph_with_types(
        vec![component(&["Parent"]), child, grandchild],
        vec![binding],
        vec![needs_args()],
    );
    let diagnostics = validate(&graph);
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(
        diagnostics[0].location,
        DiagnosticLocation::SubcomponentFactoryMethod {
            path: "Parent → Child".into(),
            method: "Child.child()".into(),
        }
    );
    assert!(diagnostics[0].message.starts_with("Grandchild requires modules"));
}

#[test]
fn module_graphs_are_not_checked() {
    let module = ComponentNode::module(ty("M"));
    let (child, binding) = child_with("NeedsArgs", &["M", "Child"], vec![]);
    let graph = graph_with_types(vec![module, child], vec![binding], vec![needs_args()]);
    let diagnostics = validate(&graph);
    assert!(
        diagnostics
            .iter()
            .all(|d| !matches!(d.location, DiagnosticLocation::SubcomponentFactoryMethod { .. })),
        "{:?}",
        diagnostics
    );
}
