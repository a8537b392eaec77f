//! The preview/compute boundary.
//!
//! For an *unsaved* draft config the UI can ask a remote compute service for
//! a preview instead of the local operators. The engine's part is to build
//! the upstream subgraph request (nodes and edges reachable backward from a
//! target, each annotated with its last-known config) and to map the
//! service's response back into the node-data cache.

use super::store::{LoadingState, NodeDataStore};
use crate::graph::{Edge, PipelineGraph, StageKind, TransformKind};
use crate::ops::TransformConfig;
use crate::table::{Row, RowTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named column with a display type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// The column name.
    pub name: String,
    /// A display type string (JSON scalar type name).
    pub data_type: String,
}

/// Infers a display schema from a table's first row.
#[must_use]
pub fn schema_of(table: &RowTable) -> Vec<SchemaField> {
    table.rows().first().map_or_else(Vec::new, |row| {
        row.iter()
            .map(|(name, value)| SchemaField {
                name: name.clone(),
                data_type: json_type_name(value).to_string(),
            })
            .collect()
    })
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A node in a preview request, annotated with its last-known config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewNode {
    /// The node id.
    pub id: String,
    /// The stage kind.
    pub stage_kind: StageKind,
    /// Which transformation, for Transformation nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformKind>,
    /// The node's last-known config, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TransformConfig>,
}

/// The subgraph submitted to the external compute endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphRequest {
    /// Nodes reachable backward from the target, in graph order.
    pub nodes: Vec<PreviewNode>,
    /// The edges among those nodes, in graph order.
    pub edges: Vec<Edge>,
}

/// The compute endpoint's answer for the target node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Schema of the target's direct upstream input.
    pub incoming_schema: Vec<SchemaField>,
    /// Schema of the target's output.
    pub schema: Vec<SchemaField>,
    /// Output rows as positional values matching `schema`.
    pub data: Vec<Vec<serde_json::Value>>,
}

/// Collects the nodes and edges reachable backward from `target`, the same
/// traversal discipline as staleness marking but reversed.
#[must_use]
pub fn upstream_subgraph(
    graph: &PipelineGraph,
    store: &NodeDataStore,
    target: &str,
) -> SubgraphRequest {
    let mut visited: HashSet<String> = HashSet::new();
    let mut upstream_edges: HashSet<String> = HashSet::new();
    let mut stack = vec![target.to_string()];

    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        for edge in graph.edges() {
            if edge.target == current {
                upstream_edges.insert(edge.id.clone());
                stack.push(edge.source.clone());
            }
        }
    }

    let nodes = graph
        .nodes()
        .iter()
        .filter(|n| visited.contains(&n.id))
        .map(|n| PreviewNode {
            id: n.id.clone(),
            stage_kind: n.stage_kind,
            transform: n.transform,
            config: store.get(&n.id).and_then(|data| data.config),
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .filter(|e| upstream_edges.contains(&e.id))
        .cloned()
        .collect();

    SubgraphRequest { nodes, edges }
}

/// Maps a compute response back into the node-data cache.
pub fn apply_preview_response(store: &NodeDataStore, node_id: &str, response: PreviewResponse) {
    let fields: Vec<String> = response.schema.iter().map(|f| f.name.clone()).collect();
    let rows: RowTable = response
        .data
        .into_iter()
        .map(|values| {
            let mut row = Row::new();
            for (field, value) in fields.iter().zip(values) {
                row.insert(field.clone(), value);
            }
            row
        })
        .collect();

    store.update(node_id, |data| {
        data.incoming_fields = Some(response.incoming_schema);
        data.fields = Some(fields);
        data.data = Some(rows);
        data.is_stale = false;
        data.loading_state = LoadingState::Done;
        data.error = None;
    });
}
