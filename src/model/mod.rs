//! Binding graph model: keys, bindings, components and the graph network.
//!
//! The graph is built once from a `GraphDescription` and then only read.

pub mod graph;
pub mod key;
pub mod types;

pub use graph::{BindingGraph, ChildFactoryMethodEdge, DependencyEdge, DependencyEdgeRef, Node};
pub use key::{Key, Scope, TypeName};
pub use types::*;

use crate::error::GraphError;

/// Deserialize a graph description from JSON.
pub fn parse(json: &str) -> Result<GraphDescription, Vec<GraphError>> {
    serde_json::from_str::<GraphDescription>(json).map_err(|e| {
        vec![GraphError::parse(
            "P001",
            format!("Failed to parse binding graph JSON: {}", e),
        )]
    })
}

/// Parse JSON and build the graph in one step.
pub fn parse_and_build(json: &str) -> Result<BindingGraph, Vec<GraphError>> {
    let description = parse(json)?;
    BindingGraph::build(description)
}
