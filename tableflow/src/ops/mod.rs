//! Transformation operators: pure functions from a config and input tables
//! to an output table plus reported field names.
//!
//! Dispatch over [`TransformConfig`] is exhaustive. Map, Sort and Aggregate
//! have declared config shapes but no semantics yet; they are rejected with
//! an explicit configuration error instead of passing data through.

mod config;
mod filter;
mod join;
mod select;

pub use config::{
    AggregationFunction, FilterCondition, FilterGroup, FilterRule, GroupOperator, JoinType,
    MapField, RuleCondition, SortOrder, TransformConfig,
};

use crate::errors::EvalError;
use crate::table::RowTable;

/// The result of applying a transformation operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// The operator's reported output column names.
    pub fields: Vec<String>,
    /// The materialized output rows.
    pub output: RowTable,
}

/// Applies the operator selected by `config` to `inputs`.
///
/// Deterministic given its inputs, with no hidden state. Filter and Select
/// take exactly one input table; Join takes exactly two, positionally
/// `[left, right]`.
pub fn apply_transform(
    config: &TransformConfig,
    inputs: &[RowTable],
) -> Result<TransformResult, EvalError> {
    match config {
        TransformConfig::Filter { rules } => {
            let input = single_input(inputs, "Filter")?;
            Ok(filter::apply(rules, input))
        }
        TransformConfig::Select { fields } => {
            let input = single_input(inputs, "Select")?;
            Ok(select::apply(fields, input))
        }
        TransformConfig::Join {
            join_type,
            left_field,
            right_field,
        } => {
            let [left, right] = inputs else {
                return Err(EvalError::type_error(format!(
                    "Join expects exactly two input tables, got {}",
                    inputs.len()
                )));
            };
            join::apply(*join_type, left_field, right_field, left, right)
        }
        TransformConfig::Map { .. } => Err(EvalError::configuration(
            "Map transformation is not supported yet",
        )),
        TransformConfig::Sort { .. } => Err(EvalError::configuration(
            "Sort transformation is not supported yet",
        )),
        TransformConfig::Aggregate { .. } => Err(EvalError::configuration(
            "Aggregate transformation is not supported yet",
        )),
    }
}

fn single_input<'a>(inputs: &'a [RowTable], operator: &str) -> Result<&'a RowTable, EvalError> {
    match inputs {
        [input] => Ok(input),
        _ => Err(EvalError::type_error(format!(
            "{operator} expects exactly one input table, got {}",
            inputs.len()
        ))),
    }
}
