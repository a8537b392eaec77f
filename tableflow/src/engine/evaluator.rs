//! Recursive upstream evaluation.
//!
//! Evaluating a node first brings every stale incomer up to date, awaiting
//! each one to completion before the dependent's operator runs. Failures are
//! fatal to the single evaluation that raised them and are recorded on the
//! node that caused them; dependents observe the failure as a dependency
//! error of their own.

use super::host::{EvalRequest, ExecutionHost};
use super::preview::schema_of;
use super::store::{LoadingState, NodeData, NodeDataStore};
use crate::errors::EvalError;
use crate::events::EventSink;
use crate::graph::{PipelineGraph, StageKind};
use crate::table::RowTable;
use futures::future::BoxFuture;
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;

/// Evaluates `node_id`, recursively refreshing stale upstream nodes first.
///
/// A fresh node (not stale, data present) returns its cached entry without
/// recomputation.
pub(crate) async fn evaluate(
    graph: &PipelineGraph,
    store: &NodeDataStore,
    host: &ExecutionHost,
    events: &dyn EventSink,
    node_id: &str,
) -> Result<NodeData, EvalError> {
    let mut path = HashSet::new();
    evaluate_inner(graph, store, host, events, node_id.to_string(), &mut path).await
}

fn evaluate_inner<'a>(
    graph: &'a PipelineGraph,
    store: &'a NodeDataStore,
    host: &'a ExecutionHost,
    events: &'a dyn EventSink,
    node_id: String,
    path: &'a mut HashSet<String>,
) -> BoxFuture<'a, Result<NodeData, EvalError>> {
    Box::pin(async move {
        if store.is_fresh(&node_id) {
            if let Some(data) = store.get(&node_id) {
                debug!(node = %node_id, "fresh, returning cached output");
                return Ok(data);
            }
        }

        if !path.insert(node_id.clone()) {
            let err = EvalError::cycle(node_id.clone());
            fail(store, events, &node_id, &err).await;
            return Err(err);
        }

        let node = match graph.node(&node_id) {
            Some(node) => node,
            None => {
                let err = EvalError::dependency(format!("unknown node '{node_id}'"));
                fail(store, events, &node_id, &err).await;
                return Err(err);
            }
        };

        if node.stage_kind == StageKind::Source {
            // Sources are seeded, never computed. A stale flag on a seeded
            // source just means the cached flags need refreshing.
            let result = match store.get(&node_id).filter(|data| data.data.is_some()) {
                Some(_) => {
                    store.update(&node_id, |data| {
                        data.is_stale = false;
                        data.loading_state = LoadingState::Done;
                        data.error = None;
                    });
                    store
                        .get(&node_id)
                        .ok_or_else(|| EvalError::host("node data vanished during evaluation"))
                }
                None => {
                    let err =
                        EvalError::dependency(format!("source node '{node_id}' has no data"));
                    fail(store, events, &node_id, &err).await;
                    Err(err)
                }
            };
            path.remove(&node_id);
            return result;
        }

        store.update(&node_id, |data| {
            data.loading_state = LoadingState::Processing;
        });
        events
            .emit("node.evaluation.started", Some(json!({"node": node_id})))
            .await;

        let incomer_ids: Vec<String> = graph
            .incomers(&node_id)
            .iter()
            .map(|n| n.id.clone())
            .collect();
        if incomer_ids.is_empty() {
            let err = EvalError::dependency(format!("node '{node_id}' has no connected input"));
            fail(store, events, &node_id, &err).await;
            return Err(err);
        }

        let mut inputs: Vec<RowTable> = Vec::with_capacity(incomer_ids.len());
        for incomer_id in incomer_ids {
            let upstream = match evaluate_inner(
                graph,
                store,
                host,
                events,
                incomer_id.clone(),
                &mut *path,
            )
            .await
            {
                Ok(data) => data,
                Err(EvalError::CycleDetected { node_id: at }) => {
                    // Cycles abort the whole walk; no per-node rewrapping.
                    let err = EvalError::cycle(at);
                    fail(store, events, &node_id, &err).await;
                    return Err(err);
                }
                Err(upstream_err) => {
                    let err = EvalError::dependency(format!(
                        "upstream node '{incomer_id}' failed: {upstream_err}"
                    ));
                    fail(store, events, &node_id, &err).await;
                    return Err(err);
                }
            };
            match upstream.data {
                Some(table) => inputs.push(table),
                None => {
                    let err = EvalError::dependency(format!(
                        "upstream node '{incomer_id}' produced no data"
                    ));
                    fail(store, events, &node_id, &err).await;
                    return Err(err);
                }
            }
        }

        let Some(config) = store.get(&node_id).and_then(|data| data.config) else {
            let err =
                EvalError::configuration(format!("node '{node_id}' has no configuration"));
            fail(store, events, &node_id, &err).await;
            return Err(err);
        };

        let incoming_fields = inputs.first().map(schema_of);
        let token = store.issue_token(&node_id);
        debug!(node = %node_id, token, "dispatching to execution host");
        let rx = host.submit(EvalRequest {
            config,
            inputs,
            is_join: node.is_join(),
            token,
        });

        let outcome = match rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                let err = EvalError::host("execution host dropped the response channel");
                fail(store, events, &node_id, &err).await;
                return Err(err);
            }
        };

        if outcome.token != store.latest_token(&node_id) {
            // A newer request owns this node now; do not touch the entry.
            debug!(node = %node_id, token = outcome.token, "discarding superseded outcome");
            path.remove(&node_id);
            return store
                .get(&node_id)
                .ok_or_else(|| EvalError::host("node data vanished during evaluation"));
        }

        let result = match outcome.result {
            Ok(transform) => {
                store.update(&node_id, |data| {
                    data.fields = Some(transform.fields.clone());
                    data.data = Some(transform.output.clone());
                    data.incoming_fields = incoming_fields;
                    data.is_stale = false;
                    data.loading_state = LoadingState::Done;
                    data.error = None;
                });
                events
                    .emit(
                        "node.evaluation.completed",
                        Some(json!({"node": node_id, "rows": transform.output.len()})),
                    )
                    .await;
                store
                    .get(&node_id)
                    .ok_or_else(|| EvalError::host("node data vanished during evaluation"))
            }
            Err(err) => {
                fail(store, events, &node_id, &err).await;
                Err(err)
            }
        };
        path.remove(&node_id);
        result
    })
}

/// Records a failure on the node and emits the failure event. Cached
/// `data`/`fields` stay untouched.
async fn fail(store: &NodeDataStore, events: &dyn EventSink, node_id: &str, err: &EvalError) {
    store.update(node_id, |data| {
        data.loading_state = LoadingState::Error;
        data.error = Some(err.to_string());
    });
    events
        .emit(
            "node.evaluation.failed",
            Some(json!({"node": node_id, "error": err.to_string()})),
        )
        .await;
}
