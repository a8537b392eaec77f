//! Node, edge and adjacency types for the pipeline graph.

use crate::errors::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of stage a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    /// A stage that produces rows (demo data, object storage, ...).
    Source,
    /// A stage that transforms rows.
    Transformation,
    /// A stage that receives final rows.
    Destination,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "Source"),
            Self::Transformation => write!(f, "Transformation"),
            Self::Destination => write!(f, "Destination"),
        }
    }
}

/// Which transformation a Transformation node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    /// Row filtering by a condition tree.
    Filter,
    /// Per-row field expressions (declared, not yet supported).
    Map,
    /// Two-input relational join.
    Join,
    /// Group-by aggregation (declared, not yet supported).
    Aggregate,
    /// Row ordering (declared, not yet supported).
    Sort,
    /// Column projection.
    Select,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter => write!(f, "Filter"),
            Self::Map => write!(f, "Map"),
            Self::Join => write!(f, "Join"),
            Self::Aggregate => write!(f, "Aggregate"),
            Self::Sort => write!(f, "Sort"),
            Self::Select => write!(f, "Select"),
        }
    }
}

/// A stage in the pipeline graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Opaque id, unique within a pipeline.
    pub id: String,
    /// The stage kind.
    pub stage_kind: StageKind,
    /// Which transformation, for Transformation nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformKind>,
    /// Display name; not used by the engine.
    pub label: String,
}

impl Node {
    /// Creates a Source node.
    #[must_use]
    pub fn source(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage_kind: StageKind::Source,
            transform: None,
            label: label.into(),
        }
    }

    /// Creates a Transformation node.
    #[must_use]
    pub fn transformation(
        id: impl Into<String>,
        transform: TransformKind,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            stage_kind: StageKind::Transformation,
            transform: Some(transform),
            label: label.into(),
        }
    }

    /// Creates a Destination node.
    #[must_use]
    pub fn destination(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage_kind: StageKind::Destination,
            transform: None,
            label: label.into(),
        }
    }

    /// Returns true if this node is a two-input Join transformation.
    #[must_use]
    pub fn is_join(&self) -> bool {
        self.transform == Some(TransformKind::Join)
    }

    /// Maximum number of incoming edges this node accepts.
    #[must_use]
    pub fn max_fan_in(&self) -> usize {
        match self.stage_kind {
            StageKind::Source => 0,
            _ if self.is_join() => 2,
            _ => 1,
        }
    }
}

/// A directed edge: output of `source` feeds input of `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Opaque edge id.
    pub id: String,
    /// The upstream node id.
    pub source: String,
    /// The downstream node id.
    pub target: String,
}

impl Edge {
    /// Creates a new edge.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// The pipeline graph: nodes, edges and adjacency queries.
///
/// Edges are kept in insertion order; [`PipelineGraph::incomers`] exposes
/// that order because Join assigns its left and right inputs positionally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl PipelineGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node with the given id, if present.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Returns the edge with the given id, if present.
    #[must_use]
    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    /// Returns all nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Nodes with an edge whose target is `node_id`, in edge-insertion order.
    #[must_use]
    pub fn incomers(&self, node_id: &str) -> Vec<&Node> {
        self.edges
            .iter()
            .filter(|e| e.target == node_id)
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    /// Nodes with an edge whose source is `node_id`, in edge-insertion order.
    #[must_use]
    pub fn outgoers(&self, node_id: &str) -> Vec<&Node> {
        self.edges
            .iter()
            .filter(|e| e.source == node_id)
            .filter_map(|e| self.node(&e.target))
            .collect()
    }

    /// Checks whether an edge from `source` to `target` would respect the
    /// fan-in invariant. Pure; callers must consult it before mutating the
    /// edge set.
    #[must_use]
    pub fn can_connect(&self, source: &str, target: &str) -> bool {
        let Some(target_node) = self.node(target) else {
            return false;
        };
        if self.node(source).is_none() {
            return false;
        }

        let existing = self.edges.iter().filter(|e| e.target == target).count();
        existing < target_node.max_fan_in()
    }

    /// Adds a node. Rejects duplicate ids.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node and every edge touching it. Returns the removed edges
    /// so callers can propagate staleness to their former targets.
    pub fn remove_node(&mut self, node_id: &str) -> Result<Vec<Edge>, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;
        self.nodes.remove(index);

        let mut removed = Vec::new();
        self.edges.retain(|e| {
            if e.source == node_id || e.target == node_id {
                removed.push(e.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    /// Adds an edge, enforcing the fan-in invariant before the edge is
    /// created.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.node(&edge.source).is_none() {
            return Err(GraphError::UnknownNode(edge.source));
        }
        if self.node(&edge.target).is_none() {
            return Err(GraphError::UnknownNode(edge.target));
        }
        if !self.can_connect(&edge.source, &edge.target) {
            return Err(GraphError::FanInExceeded {
                target: edge.target,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Removes an edge by id, returning it.
    pub fn remove_edge(&mut self, edge_id: &str) -> Result<Edge, GraphError> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| GraphError::UnknownEdge(edge_id.to_string()))?;
        Ok(self.edges.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph_with(nodes: Vec<Node>) -> PipelineGraph {
        let mut graph = PipelineGraph::new();
        for node in nodes {
            graph.add_node(node).unwrap();
        }
        graph
    }

    #[test]
    fn test_incomers_in_edge_insertion_order() {
        let mut graph = graph_with(vec![
            Node::source("s1", "demo_1"),
            Node::source("s2", "demo_2"),
            Node::transformation("j", TransformKind::Join, "join_1"),
        ]);
        graph.add_edge(Edge::new("e2", "s2", "j")).unwrap();
        graph.add_edge(Edge::new("e1", "s1", "j")).unwrap();

        let incomers: Vec<&str> = graph.incomers("j").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(incomers, vec!["s2", "s1"]);
    }

    #[test]
    fn test_outgoers() {
        let mut graph = graph_with(vec![
            Node::source("s", "demo_1"),
            Node::transformation("f1", TransformKind::Filter, "filter_1"),
            Node::transformation("f2", TransformKind::Select, "select_1"),
        ]);
        graph.add_edge(Edge::new("e1", "s", "f1")).unwrap();

        let outgoers: Vec<&str> = graph.outgoers("s").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(outgoers, vec!["f1"]);
        assert!(graph.outgoers("f2").is_empty());
    }

    #[test]
    fn test_fan_in_rejects_second_edge_into_non_join() {
        let mut graph = graph_with(vec![
            Node::source("s1", "demo_1"),
            Node::source("s2", "demo_2"),
            Node::transformation("f", TransformKind::Filter, "filter_1"),
        ]);
        graph.add_edge(Edge::new("e1", "s1", "f")).unwrap();

        assert!(!graph.can_connect("s2", "f"));
        let err = graph.add_edge(Edge::new("e2", "s2", "f")).unwrap_err();
        assert_eq!(
            err,
            GraphError::FanInExceeded {
                target: "f".to_string()
            }
        );
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_fan_in_rejects_third_edge_into_join() {
        let mut graph = graph_with(vec![
            Node::source("s1", "demo_1"),
            Node::source("s2", "demo_2"),
            Node::source("s3", "demo_3"),
            Node::transformation("j", TransformKind::Join, "join_1"),
        ]);
        graph.add_edge(Edge::new("e1", "s1", "j")).unwrap();
        assert!(graph.can_connect("s2", "j"));
        graph.add_edge(Edge::new("e2", "s2", "j")).unwrap();

        assert!(!graph.can_connect("s3", "j"));
        assert!(graph.add_edge(Edge::new("e3", "s3", "j")).is_err());
    }

    #[test]
    fn test_source_accepts_no_incoming_edges() {
        let mut graph = graph_with(vec![
            Node::source("s1", "demo_1"),
            Node::source("s2", "demo_2"),
        ]);
        assert!(!graph.can_connect("s1", "s2"));
        assert!(graph.add_edge(Edge::new("e1", "s1", "s2")).is_err());
    }

    #[test]
    fn test_can_connect_unknown_nodes() {
        let graph = graph_with(vec![Node::source("s", "demo_1")]);
        assert!(!graph.can_connect("s", "ghost"));
        assert!(!graph.can_connect("ghost", "s"));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = graph_with(vec![Node::source("s", "demo_1")]);
        let err = graph.add_node(Node::source("s", "demo_1_copy")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("s".to_string()));
    }

    #[test]
    fn test_remove_node_removes_touching_edges() {
        let mut graph = graph_with(vec![
            Node::source("s", "demo_1"),
            Node::transformation("f", TransformKind::Filter, "filter_1"),
            Node::destination("d", "gcs_1"),
        ]);
        graph.add_edge(Edge::new("e1", "s", "f")).unwrap();
        graph.add_edge(Edge::new("e2", "f", "d")).unwrap();

        let removed = graph.remove_node("f").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(graph.edges().is_empty());
        assert!(graph.node("f").is_none());
    }

    #[test]
    fn test_destination_accepts_single_edge() {
        let mut graph = graph_with(vec![
            Node::source("s1", "demo_1"),
            Node::source("s2", "demo_2"),
            Node::destination("d", "gcs_1"),
        ]);
        graph.add_edge(Edge::new("e1", "s1", "d")).unwrap();
        assert!(!graph.can_connect("s2", "d"));
    }
}
