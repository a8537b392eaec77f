//! Error types for the tableflow engine.
//!
//! Evaluation failures are always fatal to the single evaluation that raised
//! them: they are never retried automatically and never bubble past the node
//! that caused them. Structural failures (`GraphError`) are raised before the
//! graph is mutated.

use thiserror::Error;

/// The main error type for tableflow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// An evaluation failed.
    #[error("{0}")]
    Eval(#[from] EvalError),

    /// A graph mutation was rejected.
    #[error("{0}")]
    Graph(#[from] GraphError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error raised while evaluating a node.
///
/// The variant names mirror the engine's error taxonomy: configuration,
/// type, dependency and host failures are all surfaced as the node's
/// `Error` loading state plus a retrievable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Missing or invalid operator parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input data had the wrong shape for the operator.
    #[error("Type error: {0}")]
    Type(String),

    /// A required upstream input is missing or failed to evaluate.
    #[error("Dependency error: {0}")]
    Dependency(String),

    /// The offloaded computation channel itself failed.
    #[error("Execution host error: {0}")]
    Host(String),

    /// A cycle was found during the upstream walk.
    #[error("Cycle detected at node '{node_id}'")]
    CycleDetected {
        /// The node that was re-entered on the active evaluation path.
        node_id: String,
    },
}

impl EvalError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a type error.
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Creates a dependency error.
    #[must_use]
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency(message.into())
    }

    /// Creates an execution host error.
    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }

    /// Creates a cycle-detected error.
    #[must_use]
    pub fn cycle(node_id: impl Into<String>) -> Self {
        Self::CycleDetected {
            node_id: node_id.into(),
        }
    }
}

/// Error raised when a graph mutation is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The candidate edge would exceed the target's permitted fan-in.
    #[error("Connection rejected: node '{target}' does not accept another incoming edge")]
    FanInExceeded {
        /// The target node of the rejected edge.
        target: String,
    },

    /// A referenced node does not exist.
    #[error("Unknown node: '{0}'")]
    UnknownNode(String),

    /// A referenced edge does not exist.
    #[error("Unknown edge: '{0}'")]
    UnknownEdge(String),

    /// A node with this id already exists.
    #[error("Duplicate node id: '{0}'")]
    DuplicateNode(String),
}
