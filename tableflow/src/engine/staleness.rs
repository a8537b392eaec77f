//! Downstream staleness propagation.

use super::store::NodeDataStore;
use crate::graph::PipelineGraph;
use std::collections::HashSet;
use tracing::debug;

/// Marks every node reachable downstream of `node_id` as stale, without
/// marking `node_id` itself. Returns the marked ids in visit order.
///
/// The visited set guards against cycles even though the connection rules
/// keep the graph acyclic by construction.
pub fn mark_downstream_stale(
    graph: &PipelineGraph,
    store: &NodeDataStore,
    node_id: &str,
) -> Vec<String> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(node_id.to_string());

    let mut marked = Vec::new();
    let mut stack: Vec<String> = graph
        .outgoers(node_id)
        .iter()
        .rev()
        .map(|n| n.id.clone())
        .collect();

    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        store.mark_stale(&current);
        debug!(node = %current, "marked stale");
        for outgoer in graph.outgoers(&current).iter().rev() {
            if !visited.contains(&outgoer.id) {
                stack.push(outgoer.id.clone());
            }
        }
        marked.push(current);
    }

    marked
}
