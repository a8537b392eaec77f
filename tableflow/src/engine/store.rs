//! The per-node data cache.
//!
//! `NodeData` carries everything the engine caches about a node's most
//! recent evaluation, keyed by node id and separate from the node's
//! structural identity in the graph. Entries are created lazily on first
//! evaluation or explicit seeding.

use super::preview::SchemaField;
use crate::ops::TransformConfig;
use crate::table::RowTable;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of a node's most recent evaluation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingState {
    /// Never evaluated since creation.
    #[default]
    Idle,
    /// An evaluation is in flight.
    Processing,
    /// The last evaluation succeeded.
    Done,
    /// The last evaluation failed; see [`NodeData::error`].
    Error,
}

impl fmt::Display for LoadingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The engine's cached state for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Transformation-specific parameters, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TransformConfig>,
    /// Output column names from the last successful evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Column names visible from the direct upstream input; populates
    /// configuration UIs, not required for evaluation correctness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_fields: Option<Vec<SchemaField>>,
    /// Materialized output rows from the last successful evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RowTable>,
    /// True when `data`/`fields` no longer reflect the current graph and
    /// config and must not be trusted as evaluation input.
    #[serde(default)]
    pub is_stale: bool,
    /// State of the most recent evaluation attempt.
    #[serde(default)]
    pub loading_state: LoadingState,
    /// Message of the most recent failure, retrievable for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Engine-wide store of [`NodeData`], one entry per node.
///
/// Per-key updates are atomic; writes to different node ids are independent.
/// Overlapping evaluations of the *same* node resolve through the per-node
/// request token: a response is applied only if its token is still the
/// latest issued for that node.
#[derive(Debug, Default)]
pub struct NodeDataStore {
    entries: DashMap<String, NodeData>,
    tokens: DashMap<String, u64>,
}

impl NodeDataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of a node's data.
    #[must_use]
    pub fn get(&self, node_id: &str) -> Option<NodeData> {
        self.entries.get(node_id).map(|entry| entry.clone())
    }

    /// Replaces a node's data.
    pub fn set(&self, node_id: impl Into<String>, data: NodeData) {
        self.entries.insert(node_id.into(), data);
    }

    /// Atomically updates a node's data, creating a default entry if the
    /// node has none yet.
    pub fn update(&self, node_id: &str, f: impl FnOnce(&mut NodeData)) {
        let mut entry = self.entries.entry(node_id.to_string()).or_default();
        f(&mut entry);
    }

    /// Removes a node's data and token state.
    pub fn remove(&self, node_id: &str) {
        self.entries.remove(node_id);
        self.tokens.remove(node_id);
    }

    /// Marks a node's cached output as stale.
    pub fn mark_stale(&self, node_id: &str) {
        self.update(node_id, |data| data.is_stale = true);
    }

    /// True when the node's cached output is trustworthy evaluation input:
    /// an entry exists, it is not stale, and it carries data.
    #[must_use]
    pub fn is_fresh(&self, node_id: &str) -> bool {
        self.entries
            .get(node_id)
            .is_some_and(|data| !data.is_stale && data.data.is_some())
    }

    /// Issues the next request token for a node. Tokens increase
    /// monotonically per node.
    #[must_use]
    pub fn issue_token(&self, node_id: &str) -> u64 {
        let mut token = self.tokens.entry(node_id.to_string()).or_insert(0);
        *token += 1;
        *token
    }

    /// The latest token issued for a node, or 0 if none.
    #[must_use]
    pub fn latest_token(&self, node_id: &str) -> u64 {
        self.tokens.get(node_id).map_or(0, |token| *token)
    }
}
