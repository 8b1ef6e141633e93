//! Reports cycles of direct instance requests between bindings.
//!
//! A `Provider<T>` or `Lazy<T>` request defers construction, so only
//! `RequestKind::Instance` edges can close a cycle.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::graphmap::DiGraphMap;

use super::BindingGraphPlugin;
use crate::diagnostics::writer::MessageWriter;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{BindingGraph, DependencyEdgeRef, RequestKind};

pub struct DependencyCycleValidator;

impl BindingGraphPlugin for DependencyCycleValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/DependencyCycle"
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        let instance_edges: Vec<DependencyEdgeRef<'_>> = graph
            .dependency_edges()
            .filter(|e| e.edge.request.kind == RequestKind::Instance)
            .filter(|e| graph.node(e.source).as_binding().is_some())
            .filter(|e| graph.node(e.target).as_binding().is_some())
            .collect();

        let mut bindings: DiGraphMap<NodeIndex, ()> = DiGraphMap::new();
        for e in &instance_edges {
            bindings.add_edge(e.source, e.target, ());
        }

        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&bindings)
            .into_iter()
            .filter(|scc| scc.len() > 1 || bindings.contains_edge(scc[0], scc[0]))
            .collect();
        for scc in &mut cycles {
            scc.sort();
        }
        cycles.sort();

        for scc in cycles {
            let path = cycle_path(&bindings, &scc);
            let Some(first) = edge_between(&instance_edges, path[0], path[1 % path.len()]) else {
                continue;
            };
            reporter.report_dependency(Severity::Error, first.edge, &cycle_message(graph, &instance_edges, &path))?;
        }
        Ok(())
    }
}

/// The nodes of one cycle through the smallest node of `scc`, in edge order.
fn cycle_path(bindings: &DiGraphMap<NodeIndex, ()>, scc: &[NodeIndex]) -> Vec<NodeIndex> {
    let start = scc[0];
    if bindings.contains_edge(start, start) {
        return vec![start];
    }
    let members: HashSet<NodeIndex> = scc.iter().copied().collect();
    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        let mut successors: Vec<NodeIndex> = bindings.neighbors(node).collect();
        successors.sort();
        for next in successors {
            if next == start {
                let mut path = vec![node];
                let mut current = node;
                while let Some(&prev) = previous.get(&current) {
                    path.push(prev);
                    current = prev;
                }
                path.reverse();
                return path;
            }
            if members.contains(&next) && !previous.contains_key(&next) && next != start {
                previous.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    scc.to_vec()
}

fn edge_between<'g>(
    edges: &[DependencyEdgeRef<'g>],
    source: NodeIndex,
    target: NodeIndex,
) -> Option<DependencyEdgeRef<'g>> {
    edges
        .iter()
        .copied()
        .find(|e| e.source == source && e.target == target)
}

fn cycle_message(graph: &BindingGraph, edges: &[DependencyEdgeRef<'_>], path: &[NodeIndex]) -> String {
    let mut writer = MessageWriter::new("Found a dependency cycle:");
    writer.indent();
    for (i, &source) in path.iter().enumerate() {
        let target = path[(i + 1) % path.len()];
        let Some(edge) = edge_between(edges, source, target) else {
            continue;
        };
        let requester = graph.node(source).as_binding().map(|b| b.to_string()).unwrap_or_default();
        writer.line(&format!("{} is injected at", edge.edge.request.key));
        writer.indent();
        writer.line(&format!("[{}] {requester}", edge.edge.component_path));
        writer.dedent();
    }
    writer.finish()
}
