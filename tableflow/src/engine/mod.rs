//! The evaluation engine: node-data cache, staleness propagation, upstream
//! evaluation, execution host and the preview boundary, behind the
//! [`FlowEngine`] facade.

mod evaluator;
mod host;
mod preview;
mod staleness;
mod store;


pub use host::{EvalOutcome, EvalRequest, ExecutionHost};
pub use preview::{schema_of, PreviewNode, PreviewResponse, SchemaField, SubgraphRequest};
pub use staleness::mark_downstream_stale;
pub use store::{LoadingState, NodeData, NodeDataStore};

use crate::errors::{EvalError, FlowError};
use crate::events::{EventSink, NoOpEventSink};
use crate::graph::{Edge, Node, PipelineGraph};
use crate::ops::TransformConfig;
use crate::table::RowTable;
use crate::utils::generate_uuid;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// The engine facade: owned pipeline graph, per-node data cache, execution
/// host and event sink.
///
/// Graph mutation and staleness propagation are synchronous; only operator
/// execution is asynchronous. The graph is held behind a lock that is never
/// held across an await; evaluation runs against a snapshot.
pub struct FlowEngine {
    graph: RwLock<PipelineGraph>,
    store: NodeDataStore,
    host: ExecutionHost,
    events: Arc<dyn EventSink>,
}

impl Default for FlowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowEngine {
    /// Creates an engine with no event sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_event_sink(Arc::new(NoOpEventSink))
    }

    /// Creates an engine that reports lifecycle events to `events`.
    #[must_use]
    pub fn with_event_sink(events: Arc<dyn EventSink>) -> Self {
        Self {
            graph: RwLock::new(PipelineGraph::new()),
            store: NodeDataStore::new(),
            host: ExecutionHost::new(),
            events,
        }
    }

    /// Returns a snapshot of the current graph.
    #[must_use]
    pub fn graph(&self) -> PipelineGraph {
        self.graph.read().clone()
    }

    /// Returns a snapshot of a node's cached data.
    #[must_use]
    pub fn node_data(&self, node_id: &str) -> Option<NodeData> {
        self.store.get(node_id)
    }

    /// Adds a node. Transformation nodes are seeded with their kind's
    /// default config and start stale.
    pub fn add_node(&self, node: Node) -> Result<(), FlowError> {
        let node_id = node.id.clone();
        let default_config = node.transform.and_then(TransformConfig::default_for);
        self.graph.write().add_node(node)?;

        if let Some(config) = default_config {
            self.store.update(&node_id, |data| {
                data.config = Some(config);
                data.is_stale = true;
            });
        }
        debug!(node = %node_id, "node added");
        Ok(())
    }

    /// Removes a node, its cached data and every edge touching it. Targets
    /// of the removed outgoing edges become stale, along with their
    /// downstream.
    pub fn remove_node(&self, node_id: &str) -> Result<(), FlowError> {
        let removed = self.graph.write().remove_node(node_id)?;
        self.store.remove(node_id);

        let snapshot = self.graph();
        for edge in removed.iter().filter(|e| e.source == node_id) {
            self.store.mark_stale(&edge.target);
            self.propagate_stale(&snapshot, &edge.target);
        }
        debug!(node = %node_id, edges = removed.len(), "node removed");
        Ok(())
    }

    /// Checks whether an edge from `source` to `target` would respect the
    /// fan-in rules, without mutating anything.
    #[must_use]
    pub fn can_connect(&self, source: &str, target: &str) -> bool {
        self.graph.read().can_connect(source, target)
    }

    /// Connects `source` to `target`, returning the new edge's id. The
    /// target's downstream becomes stale; the target itself is left for the
    /// next evaluation to pick up.
    pub fn connect(&self, source: &str, target: &str) -> Result<String, FlowError> {
        let edge_id = generate_uuid().to_string();
        self.graph
            .write()
            .add_edge(Edge::new(edge_id.clone(), source, target))?;

        let snapshot = self.graph();
        self.propagate_stale(&snapshot, target);
        self.events.try_emit(
            "edge.connected",
            Some(json!({"edge": edge_id, "source": source, "target": target})),
        );
        Ok(edge_id)
    }

    /// Removes an edge. The former target and its downstream become stale.
    pub fn disconnect(&self, edge_id: &str) -> Result<Edge, FlowError> {
        let edge = self.graph.write().remove_edge(edge_id)?;

        let snapshot = self.graph();
        self.store.mark_stale(&edge.target);
        self.propagate_stale(&snapshot, &edge.target);
        self.events.try_emit(
            "edge.removed",
            Some(json!({"edge": edge.id, "source": edge.source, "target": edge.target})),
        );
        Ok(edge)
    }

    /// Seeds a Source node's rows. The node becomes fresh; anything
    /// downstream of it becomes stale.
    pub fn seed_source(&self, node_id: &str, table: RowTable) {
        self.store.update(node_id, |data| {
            data.fields = Some(table.fields());
            data.data = Some(table);
            data.is_stale = false;
            data.loading_state = LoadingState::Done;
            data.error = None;
        });
        let snapshot = self.graph();
        self.propagate_stale(&snapshot, node_id);
    }

    /// Saves a node's config, re-evaluates the node, then marks its
    /// downstream stale. The downstream marking happens whether or not the
    /// evaluation succeeded; dependents must not trust their caches either
    /// way.
    pub async fn save_config(
        &self,
        node_id: &str,
        config: TransformConfig,
    ) -> Result<NodeData, FlowError> {
        self.store.update(node_id, |data| {
            data.config = Some(config);
            data.is_stale = true;
        });
        self.events
            .try_emit("node.config.saved", Some(json!({"node": node_id})));

        let result = self.evaluate(node_id).await;

        let snapshot = self.graph();
        self.propagate_stale(&snapshot, node_id);
        result.map_err(Into::into)
    }

    /// Evaluates a node, refreshing stale upstream nodes first.
    pub async fn evaluate(&self, node_id: &str) -> Result<NodeData, EvalError> {
        let snapshot = self.graph();
        evaluator::evaluate(
            &snapshot,
            &self.store,
            &self.host,
            self.events.as_ref(),
            node_id,
        )
        .await
    }

    /// Builds the preview request for everything upstream of `target`,
    /// inclusive.
    #[must_use]
    pub fn upstream_subgraph(&self, target: &str) -> SubgraphRequest {
        let snapshot = self.graph();
        preview::upstream_subgraph(&snapshot, &self.store, target)
    }

    /// Applies a compute service's preview response to a node's cache.
    pub fn apply_preview_response(&self, node_id: &str, response: PreviewResponse) {
        preview::apply_preview_response(&self.store, node_id, response);
    }

    fn propagate_stale(&self, graph: &PipelineGraph, node_id: &str) {
        let marked = mark_downstream_stale(graph, &self.store, node_id);
        if !marked.is_empty() {
            self.events
                .try_emit("node.stale", Some(json!({"nodes": marked})));
        }
    }
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.graph.read();
        f.debug_struct("FlowEngine")
            .field("nodes", &graph.nodes().len())
            .field("edges", &graph.edges().len())
            .finish_non_exhaustive()
    }
}
