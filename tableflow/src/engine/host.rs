//! The execution host: runs transformation operators off the interactive
//! path and delivers exactly one terminal outcome per request.

use crate::errors::EvalError;
use crate::ops::{apply_transform, TransformConfig, TransformResult};
use crate::table::RowTable;
use tokio::sync::oneshot;
use tracing::debug;

/// An evaluation request for one node.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    /// The node's transformation config.
    pub config: TransformConfig,
    /// Upstream outputs, in incomer order.
    pub inputs: Vec<RowTable>,
    /// Whether the requesting node is a two-input Join, for arity
    /// validation before the operator runs.
    pub is_join: bool,
    /// The request token issued for this evaluation.
    pub token: u64,
}

/// The terminal message for one request.
#[derive(Debug)]
pub struct EvalOutcome {
    /// Echo of the request token, for supersession checks.
    pub token: u64,
    /// The operator result or the failure that stopped it.
    pub result: Result<TransformResult, EvalError>,
}

/// Runs evaluation requests on blocking workers so the interactive control
/// flow stays responsive while a computation is in flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionHost;

impl ExecutionHost {
    /// Creates a new host.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Submits a request. The returned receiver resolves with exactly one
    /// [`EvalOutcome`]; a dropped receiver means the host task failed and is
    /// treated as an [`EvalError::Host`] by the caller.
    pub fn submit(&self, request: EvalRequest) -> oneshot::Receiver<EvalOutcome> {
        let (tx, rx) = oneshot::channel();
        let token = request.token;

        tokio::spawn(async move {
            let outcome = match tokio::task::spawn_blocking(move || run(&request)).await {
                Ok(result) => EvalOutcome { token, result },
                Err(join_err) => EvalOutcome {
                    token,
                    result: Err(EvalError::host(format!(
                        "computation task failed: {join_err}"
                    ))),
                },
            };
            // The requester may have gone away; dropping the outcome is fine.
            let _ = tx.send(outcome);
        });

        rx
    }
}

fn run(request: &EvalRequest) -> Result<TransformResult, EvalError> {
    if request.is_join {
        if request.inputs.len() != 2 {
            return Err(EvalError::dependency(format!(
                "Join requires exactly two connected inputs, got {}",
                request.inputs.len()
            )));
        }
        debug!("processing join transformation");
    } else {
        if request.inputs.len() != 1 {
            return Err(EvalError::dependency(format!(
                "transformation requires exactly one connected input, got {}",
                request.inputs.len()
            )));
        }
        debug!("processing transformation");
    }

    apply_transform(&request.config, &request.inputs)
}
