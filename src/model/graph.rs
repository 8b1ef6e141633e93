//! petgraph-based binding graph.
//!
//! Nodes are components, bindings and missing bindings. Edges are dependency
//! requests (binding or component → the binding that satisfies the request)
//! and child factory methods (parent component → child component).

use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use super::key::Key;
use super::types::*;
use crate::error::GraphError;

#[derive(Debug, Clone)]
pub enum Node {
    Component(ComponentNode),
    Binding(Binding),
    MissingBinding(MissingBinding),
}

impl Node {
    pub fn component_path(&self) -> &ComponentPath {
        match self {
            Node::Component(c) => &c.component_path,
            Node::Binding(b) => &b.component_path,
            Node::MissingBinding(m) => &m.component_path,
        }
    }

    pub fn as_binding(&self) -> Option<&Binding> {
        match self {
            Node::Binding(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentNode> {
        match self {
            Node::Component(c) => Some(c),
            _ => None,
        }
    }
}

/// A request from a binding (or a component entry point) for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub request: DependencyRequest,
    pub entry_point: bool,
    /// Component of the requesting binding or entry point.
    pub component_path: ComponentPath,
    /// Key of the requesting binding; `None` for entry points.
    pub requesting_key: Option<Key>,
}

/// A subcomponent factory method declared on a parent component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildFactoryMethodEdge {
    pub factory_method: SourceElement,
    pub parent: ComponentPath,
    pub child: ComponentPath,
}

#[derive(Debug, Clone)]
pub enum Edge {
    Dependency(DependencyEdge),
    ChildFactoryMethod(ChildFactoryMethodEdge),
}

/// A dependency edge together with its endpoints.
#[derive(Debug, Clone, Copy)]
pub struct DependencyEdgeRef<'a> {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub edge: &'a DependencyEdge,
}

#[derive(Debug)]
pub struct BindingGraph {
    network: DiGraph<Node, Edge>,
    components: IndexMap<ComponentPath, NodeIndex>,
    bindings: Vec<NodeIndex>,
    bindings_by_key: IndexMap<Key, Vec<NodeIndex>>,
    missing: Vec<NodeIndex>,
    types: IndexMap<String, TypeDescriptor>,
    root: NodeIndex,
    full_binding_graph: bool,
}

impl BindingGraph {
    pub fn build(description: GraphDescription) -> Result<Self, Vec<GraphError>> {
        let GraphDescription {
            components,
            bindings,
            types,
            full_binding_graph,
        } = description;

        let mut builder = GraphBuilder::default();
        let root = builder.add_components(components)?;
        builder.add_bindings(bindings);
        if !builder.errors.is_empty() {
            return Err(builder.errors);
        }
        builder.connect_dependencies();
        if !builder.errors.is_empty() {
            return Err(builder.errors);
        }

        debug!(
            components = builder.components.len(),
            bindings = builder.bindings.len(),
            missing = builder.missing.len(),
            "built binding graph"
        );

        Ok(BindingGraph {
            network: builder.network,
            components: builder.components,
            bindings: builder.bindings,
            bindings_by_key: builder.bindings_by_key,
            missing: builder.missing.into_values().collect(),
            types: types
                .into_iter()
                .map(|t| (t.name.raw_name().to_string(), t))
                .collect(),
            root,
            full_binding_graph,
        })
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.network[index]
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> + '_ {
        self.bindings
            .iter()
            .filter_map(|&idx| self.network[idx].as_binding())
    }

    /// Every binding for `key`, in any component.
    pub fn bindings_for<'a>(&'a self, key: &Key) -> impl Iterator<Item = &'a Binding> + use<'a> {
        self.bindings_by_key
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.network[idx].as_binding())
    }

    /// Node index of a binding owned by this graph.
    pub fn binding_index(&self, binding: &Binding) -> Option<NodeIndex> {
        let candidates = self.bindings_by_key.get(&binding.key)?;
        candidates
            .iter()
            .copied()
            .find(|&idx| {
                self.network[idx]
                    .as_binding()
                    .is_some_and(|b| std::ptr::eq(b, binding))
            })
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .find(|&idx| self.network[idx].as_binding() == Some(binding))
            })
    }

    /// The bindings that directly satisfy `binding`'s dependencies, in request order.
    pub fn requested_bindings(&self, binding: &Binding) -> Vec<&Binding> {
        let Some(idx) = self.binding_index(binding) else {
            return vec![];
        };
        let mut requested: Vec<(NodeIndex, &Binding)> = Vec::new();
        for edge in self.edges_at(idx, Direction::Outgoing) {
            if let Some(b) = self.network[edge.target].as_binding() {
                if !requested.iter().any(|(i, _)| *i == edge.target) {
                    requested.push((edge.target, b));
                }
            }
        }
        requested.into_iter().map(|(_, b)| b).collect()
    }

    /// Dependency edges that point at `binding`, in insertion order.
    pub fn in_dependency_edges(&self, binding: &Binding) -> Vec<DependencyEdgeRef<'_>> {
        match self.binding_index(binding) {
            Some(idx) => self.edges_at(idx, Direction::Incoming),
            None => vec![],
        }
    }

    /// Dependency edges that point at a missing binding.
    pub fn requests_for_missing(&self, missing: &MissingBinding) -> Vec<DependencyEdgeRef<'_>> {
        self.missing
            .iter()
            .copied()
            .find(|&idx| matches!(&self.network[idx], Node::MissingBinding(m) if m == missing))
            .map(|idx| self.edges_at(idx, Direction::Incoming))
            .unwrap_or_default()
    }

    fn edges_at(&self, idx: NodeIndex, direction: Direction) -> Vec<DependencyEdgeRef<'_>> {
        let mut edges: Vec<_> = self.network.edges_directed(idx, direction).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .filter_map(|e| match e.weight() {
                Edge::Dependency(edge) => Some(DependencyEdgeRef {
                    source: e.source(),
                    target: e.target(),
                    edge,
                }),
                Edge::ChildFactoryMethod(_) => None,
            })
            .collect()
    }

    pub fn dependency_edges(&self) -> impl Iterator<Item = DependencyEdgeRef<'_>> + '_ {
        self.network
            .edge_references()
            .filter_map(|e| match e.weight() {
                Edge::Dependency(edge) => Some(DependencyEdgeRef {
                    source: e.source(),
                    target: e.target(),
                    edge,
                }),
                Edge::ChildFactoryMethod(_) => None,
            })
    }

    pub fn child_factory_method_edges(&self) -> impl Iterator<Item = &ChildFactoryMethodEdge> + '_ {
        self.network.edge_weights().filter_map(|e| match e {
            Edge::ChildFactoryMethod(edge) => Some(edge),
            Edge::Dependency(_) => None,
        })
    }

    pub fn missing_bindings(&self) -> impl Iterator<Item = &MissingBinding> + '_ {
        self.missing.iter().filter_map(|&idx| match &self.network[idx] {
            Node::MissingBinding(m) => Some(m),
            _ => None,
        })
    }

    pub fn component_node(&self, path: &ComponentPath) -> Option<&ComponentNode> {
        let &idx = self.components.get(path)?;
        self.network[idx].as_component()
    }

    pub fn component_nodes(&self) -> impl Iterator<Item = &ComponentNode> + '_ {
        self.components
            .values()
            .filter_map(|&idx| self.network[idx].as_component())
    }

    pub fn root_component_node(&self) -> &ComponentNode {
        self.network[self.root]
            .as_component()
            .expect("root index always refers to a component node")
    }

    pub fn is_full_binding_graph(&self) -> bool {
        self.full_binding_graph
    }

    /// True when the root is a synthetic node for a module validated on its own.
    pub fn is_module_binding_graph(&self) -> bool {
        !self.root_component_node().is_real_component()
    }

    /// Looks up a type by erased name.
    pub fn type_descriptor(&self, raw_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(raw_name)
    }
}

#[derive(Default)]
struct GraphBuilder {
    network: DiGraph<Node, Edge>,
    components: IndexMap<ComponentPath, NodeIndex>,
    bindings: Vec<NodeIndex>,
    bindings_by_key: IndexMap<Key, Vec<NodeIndex>>,
    missing: IndexMap<(ComponentPath, Key), NodeIndex>,
    errors: Vec<GraphError>,
}

impl GraphBuilder {
    fn add_components(&mut self, components: Vec<ComponentNode>) -> Result<NodeIndex, Vec<GraphError>> {
        let mut root = None;

        for component in components {
            let path = component.component_path.clone();
            if self.components.contains_key(&path) {
                self.errors.push(GraphError::build(
                    "B003",
                    format!("Component '{}' is declared more than once", path),
                    Some(path.to_string()),
                ));
                continue;
            }
            if path.at_root() && root.is_some() {
                self.errors.push(GraphError::build(
                    "B001",
                    format!("Graph must have exactly 1 root component, found another: '{}'", path),
                    Some(path.to_string()),
                ));
                continue;
            }
            let idx = self.network.add_node(Node::Component(component));
            if path.at_root() {
                root = Some(idx);
            }
            self.components.insert(path, idx);
        }

        let Some(root) = root else {
            self.errors.push(GraphError::build(
                "B001",
                "Graph must have exactly 1 root component, found 0",
                None,
            ));
            return Err(std::mem::take(&mut self.errors));
        };

        let children: Vec<(ComponentPath, NodeIndex)> = self
            .components
            .iter()
            .filter(|(path, _)| !path.at_root())
            .map(|(path, &idx)| (path.clone(), idx))
            .collect();
        for (path, idx) in children {
            let Ok(parent) = path.parent() else { continue };
            let Some(&parent_idx) = self.components.get(&parent) else {
                self.errors.push(GraphError::build(
                    "B002",
                    format!("Component '{}' has no parent component '{}'", path, parent),
                    Some(path.to_string()),
                ));
                continue;
            };
            let factory_method = self.network[idx]
                .as_component()
                .and_then(|c| c.factory_method.clone());
            if let Some(factory_method) = factory_method {
                self.network.add_edge(
                    parent_idx,
                    idx,
                    Edge::ChildFactoryMethod(ChildFactoryMethodEdge {
                        factory_method,
                        parent,
                        child: path,
                    }),
                );
            }
        }

        Ok(root)
    }

    fn add_bindings(&mut self, bindings: Vec<Binding>) {
        for binding in bindings {
            if !self.components.contains_key(&binding.component_path) {
                self.errors.push(GraphError::build(
                    "B004",
                    format!(
                        "Binding for '{}' is owned by unknown component '{}'",
                        binding.key, binding.component_path
                    ),
                    Some(binding.component_path.to_string()),
                ));
                continue;
            }
            if binding.key.type_name.contains_wildcard() {
                self.errors.push(GraphError::build(
                    "B005",
                    format!("Binding key '{}' contains a wildcard", binding.key),
                    Some(binding.component_path.to_string()),
                ));
                continue;
            }
            let key = binding.key.clone();
            let idx = self.network.add_node(Node::Binding(binding));
            self.bindings.push(idx);
            self.bindings_by_key.entry(key).or_default().push(idx);
        }
    }

    fn connect_dependencies(&mut self) {
        for idx in self.bindings.clone() {
            let Some(binding) = self.network[idx].as_binding() else {
                continue;
            };
            let path = binding.component_path.clone();
            let requesting_key = binding.key.clone();
            for request in binding.dependencies.clone() {
                self.connect(idx, &path, request, Some(requesting_key.clone()));
            }
        }

        let components: Vec<(ComponentPath, NodeIndex)> = self
            .components
            .iter()
            .map(|(path, &idx)| (path.clone(), idx))
            .collect();
        for (path, idx) in components {
            let entry_points = self.network[idx]
                .as_component()
                .map(|c| c.entry_points.clone())
                .unwrap_or_default();
            for request in entry_points {
                self.connect(idx, &path, request, None);
            }
        }
    }

    fn connect(
        &mut self,
        source: NodeIndex,
        path: &ComponentPath,
        request: DependencyRequest,
        requesting_key: Option<Key>,
    ) {
        if request.key.type_name.contains_wildcard() {
            self.errors.push(GraphError::build(
                "B005",
                format!("Request for '{}' contains a wildcard", request.key),
                Some(path.to_string()),
            ));
            return;
        }

        let mut targets = self.resolve(&request.key, path);
        if targets.is_empty() {
            let missing_key = (path.clone(), request.key.clone());
            let idx = match self.missing.get(&missing_key) {
                Some(&idx) => idx,
                None => {
                    let idx = self.network.add_node(Node::MissingBinding(MissingBinding {
                        component_path: path.clone(),
                        key: request.key.clone(),
                    }));
                    self.missing.insert(missing_key, idx);
                    idx
                }
            };
            targets.push(idx);
        }

        let entry_point = requesting_key.is_none();
        for target in targets {
            self.network.add_edge(
                source,
                target,
                Edge::Dependency(DependencyEdge {
                    request: request.clone(),
                    entry_point,
                    component_path: path.clone(),
                    requesting_key: requesting_key.clone(),
                }),
            );
        }
    }

    /// Bindings for `key` declared at `from` or, failing that, at its nearest
    /// ancestor that declares any.
    fn resolve(&self, key: &Key, from: &ComponentPath) -> Vec<NodeIndex> {
        let Some(candidates) = self.bindings_by_key.get(key) else {
            return vec![];
        };
        std::iter::once(from.clone())
            .chain(from.ancestors())
            .find_map(|path| {
                let found: Vec<NodeIndex> = candidates
                    .iter()
                    .copied()
                    .filter(|&idx| self.network[idx].component_path() == &path)
                    .collect();
                (!found.is_empty()).then_some(found)
            })
            .unwrap_or_default()
    }
}
