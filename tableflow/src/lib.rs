//! # Tableflow
//!
//! An incremental dataflow evaluation engine for tabular pipeline previews.
//!
//! Tableflow tracks a directed graph of data-processing stages (sources,
//! transformations, destinations) and keeps a live preview of the rows
//! flowing through it:
//!
//! - **Staleness tracking**: graph or config changes mark exactly the
//!   affected downstream nodes as stale
//! - **Upstream evaluation**: opening a node's preview recomputes only the
//!   stale dependencies, in dependency order
//! - **Relational operators**: Filter, Select and Join over row-oriented
//!   tables
//! - **Offloaded execution**: operators run off the interactive path and
//!   report back through a token-guarded message channel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tableflow::prelude::*;
//!
//! let engine = FlowEngine::new();
//! engine.add_node(Node::source("src", "demo_1"))?;
//! engine.add_node(Node::transformation("flt", TransformKind::Filter, "filter_1"))?;
//! engine.seed_source("src", rows);
//! engine.connect("src", "flt")?;
//! engine.save_config("flt", config).await?;
//! let preview = engine.evaluate("flt").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod engine;
pub mod errors;
pub mod events;
pub mod graph;
pub mod observability;
pub mod ops;
pub mod table;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{
        EvalOutcome, EvalRequest, ExecutionHost, FlowEngine, LoadingState, NodeData,
        NodeDataStore, PreviewResponse, SchemaField, SubgraphRequest,
    };
    pub use crate::errors::{EvalError, FlowError, GraphError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::graph::{Edge, Node, PipelineGraph, StageKind, TransformKind};
    pub use crate::ops::{
        FilterCondition, FilterGroup, FilterRule, GroupOperator, JoinType, RuleCondition,
        SortOrder, TransformConfig, TransformResult,
    };
    pub use crate::table::{Row, RowTable};
    pub use crate::utils::{generate_uuid, iso_timestamp};
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
