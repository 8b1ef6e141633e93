//! Shared pieces of diagnostic messages: declaration lists and dependency traces.

use super::writer::{INDENT, MessageWriter};
use crate::model::{Binding, BindingGraph, ComponentPath, DependencyEdge, DependencyEdgeRef, Key, Node};

/// Longest declaration or request list printed before eliding the rest.
pub const DECLARATION_LIMIT: usize = 10;

/// A binding's declaration, followed by its component path unless it is owned
/// by the root component.
pub fn declaration(binding: &Binding) -> String {
    if binding.component_path.at_root() {
        binding.to_string()
    } else {
        format!("{binding} [{}]", binding.component_path)
    }
}

/// A scoped declaration as written in source, e.g. `@Singleton @Provides Foo M.foo()`.
pub fn scoped_declaration(binding: &Binding) -> String {
    match &binding.scope {
        Some(scope) => format!("{scope} {binding}"),
        None => binding.to_string(),
    }
}

/// Writes one line per declaration at the writer's current indent, rootmost
/// first, then by declaration text.
pub fn write_declarations<'a>(writer: &mut MessageWriter, bindings: impl IntoIterator<Item = &'a Binding>) {
    let mut lines: Vec<(usize, String)> = bindings
        .into_iter()
        .map(|b| (b.component_path.depth(), declaration(b)))
        .collect();
    lines.sort();
    lines.dedup();
    write_limited(writer, lines.into_iter().map(|(_, line)| line));
}

/// Writes at most [`DECLARATION_LIMIT`] lines, then `and N others`.
pub fn write_limited(writer: &mut MessageWriter, lines: impl IntoIterator<Item = String>) {
    let lines: Vec<String> = lines.into_iter().collect();
    for line in lines.iter().take(DECLARATION_LIMIT) {
        writer.line(line);
    }
    if lines.len() > DECLARATION_LIMIT {
        writer.line(&format!("and {} others", lines.len() - DECLARATION_LIMIT));
    }
}

/// `\n    component path: A → B`, or nothing at the root.
pub fn component_path_unless_at_root(path: &ComponentPath) -> String {
    if path.at_root() {
        String::new()
    } else {
        format!("\n{INDENT}component path: {path}")
    }
}

/// Describes whoever made a request: the requesting binding's declaration,
/// or the entry-point method on a component.
fn requester(graph: &BindingGraph, edge: &DependencyEdgeRef<'_>) -> String {
    match graph.node(edge.source) {
        Node::Binding(binding) => binding.to_string(),
        Node::Component(component) => match &edge.edge.request.element {
            Some(element) => element.to_string(),
            None => component.component_path.current_component().to_string(),
        },
        Node::MissingBinding(missing) => missing.key.to_string(),
    }
}

/// `\n    Foo is injected at\n        [C] @Inject Bar(Foo)` for every request of
/// `key` among `edges`.
pub fn dependency_trace(graph: &BindingGraph, key: &Key, edges: &[DependencyEdgeRef<'_>]) -> String {
    if edges.is_empty() {
        return String::new();
    }
    let verb = if edges.iter().all(|e| e.edge.entry_point) {
        "is requested at"
    } else {
        "is injected at"
    };
    let mut writer = MessageWriter::default();
    writer.indent();
    writer.line(&format!("{key} {verb}"));
    writer.indent();
    write_limited(
        &mut writer,
        edges
            .iter()
            .map(|e| format!("[{}] {}", e.edge.component_path, requester(graph, e))),
    );
    writer.finish()
}

/// Trace of every request satisfied by `binding`.
pub fn binding_trace(graph: &BindingGraph, binding: &Binding) -> String {
    dependency_trace(graph, &binding.key, &graph.in_dependency_edges(binding))
}

/// Trace of a single dependency edge owned by `graph`.
pub fn dependency_edge_trace(graph: &BindingGraph, edge: &DependencyEdge) -> String {
    let found = graph
        .dependency_edges()
        .find(|e| std::ptr::eq(e.edge, edge))
        .or_else(|| graph.dependency_edges().find(|e| e.edge == edge));
    match found {
        Some(edge_ref) => dependency_trace(graph, &edge.request.key, &[edge_ref]),
        None => String::new(),
    }
}
