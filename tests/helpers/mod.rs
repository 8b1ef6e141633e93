use bindgraph::diagnostics::{Diagnostic, DiagnosticLocation, Severity};
use bindgraph::model::*;
use bindgraph::options::ValidationOptions;
use bindgraph::validate::validate_graph;

// =============================================================================
// Model builders
// =============================================================================

pub fn ty(s: &str) -> TypeName {
    s.parse().expect("valid type expression")
}

pub fn key(s: &str) -> Key {
    Key::new(ty(s))
}

pub fn path(components: &[&str]) -> ComponentPath {
    ComponentPath::new(components.iter().map(|c| ty(c)).collect()).expect("non-empty path")
}

pub fn component(components: &[&str]) -> ComponentNode {
    ComponentNode::new(path(components))
}

pub fn request(k: &str) -> DependencyRequest {
    DependencyRequest::instance(key(k))
}

/// `@Provides <key> <module>.<method>()` owned by the component at `at`.
pub fn provides(k: &str, module: &str, method: &str, at: &[&str]) -> Binding {
    provides_key(key(k), module, method, at)
}

pub fn provides_key(k: Key, module: &str, method: &str, at: &[&str]) -> Binding {
    Binding::new(k, BindingKind::Provision, path(at))
        .with_element(SourceElement::method(ty(module), method, vec![]))
        .with_module(ty(module))
}

/// `@Inject <type>(<params>)` owned by the component at `at`, requesting
/// every parameter as an instance.
pub fn inject(k: &str, params: &[&str], at: &[&str]) -> Binding {
    let binding = Binding::new(key(k), BindingKind::Injection, path(at)).with_element(
        SourceElement::constructor(ty(k), params.iter().map(|p| ty(p)).collect()),
    );
    params
        .iter()
        .fold(binding, |b, p| b.with_dependency(request(p)))
}

/// `@Binds <key> <module>.<method>(<target>)`.
pub fn binds(k: Key, module: &str, method: &str, target: &str, at: &[&str]) -> Binding {
    Binding::new(k, BindingKind::Delegate, path(at))
        .with_element(SourceElement::method(ty(module), method, vec![ty(target)]))
        .with_module(ty(module))
        .with_dependency(request(target))
}

pub fn string_key(value: &str) -> MapKey {
    MapKey {
        annotation_type: ty("dagger.multibindings.StringKey"),
        value: format!("\"{value}\""),
    }
}

pub fn scope(name: &str) -> Scope {
    Scope::new(name)
}

pub fn graph(components: Vec<ComponentNode>, bindings: Vec<Binding>) -> BindingGraph {
    graph_with_types(components, bindings, vec![])
}

pub fn graph_with_types(
    components: Vec<ComponentNode>,
    bindings: Vec<Binding>,
    types: Vec<TypeDescriptor>,
) -> BindingGraph {
    BindingGraph::build(GraphDescription {
        components,
        bindings,
        types,
        full_binding_graph: false,
    })
    .expect("graph should build")
}

// =============================================================================
// Running validation
// =============================================================================

pub fn validate(graph: &BindingGraph) -> Vec<Diagnostic> {
    validate_with(graph, &ValidationOptions::default())
}

pub fn validate_with(graph: &BindingGraph, options: &ValidationOptions) -> Vec<Diagnostic> {
    validate_graph(graph, options).expect("no internal validation errors")
}

pub fn experimental() -> ValidationOptions {
    ValidationOptions {
        experimental_dagger_error_messages: true,
        ..Default::default()
    }
}

pub fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect()
}

pub fn warnings(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect()
}

pub fn component_location(p: &str) -> DiagnosticLocation {
    DiagnosticLocation::Component { path: p.into() }
}
