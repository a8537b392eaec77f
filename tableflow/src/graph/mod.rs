//! The pipeline graph model: nodes, edges and adjacency queries.
//!
//! The graph is explicit, owned state: callers hold a [`PipelineGraph`] and
//! pass it (or the engine holding it) around; there is no ambient global.

mod model;

pub use model::{Edge, Node, PipelineGraph, StageKind, TransformKind};
