//! Transformation configuration shapes.
//!
//! These mirror the JSON configs produced by the editor's configuration
//! forms: a `"type"`-tagged union with camelCase fields, lowercase join
//! types and upper-case group operators, so stored pipeline definitions
//! deserialize unchanged.

use crate::graph::TransformKind;
use serde::{Deserialize, Serialize};

/// Supported filter rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleCondition {
    /// Loose equality.
    Equals,
    /// Loose inequality.
    NotEquals,
    /// Numeric/lexicographic greater-than.
    GreaterThan,
    /// Numeric/lexicographic less-than.
    LessThan,
}

/// A leaf condition comparing one field against a literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    /// The column to test.
    pub field: String,
    /// The comparison to apply.
    pub condition: RuleCondition,
    /// The literal to compare against.
    pub value: serde_json::Value,
}

/// How a group combines its children's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum GroupOperator {
    /// All children must be true. Vacuously true when empty.
    AND,
    /// At least one child must be true. Vacuously false when empty.
    OR,
}

/// A boolean combination of rules and nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    /// The combining operator.
    pub operator: GroupOperator,
    /// Child conditions, evaluated in order.
    pub conditions: Vec<FilterCondition>,
}

impl FilterGroup {
    /// An empty AND group, the default for a freshly placed Filter node.
    #[must_use]
    pub fn empty_and() -> Self {
        Self {
            operator: GroupOperator::AND,
            conditions: Vec::new(),
        }
    }
}

/// A node in the filter condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FilterCondition {
    /// A leaf rule.
    Rule(FilterRule),
    /// A nested group.
    Group(Box<FilterGroup>),
}

/// How matching rows are combined in a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Matching pairs only.
    Inner,
    /// Every left row, nulls for unmatched right fields.
    Left,
    /// Every right row, nulls for unmatched left fields.
    Right,
}

/// Sort direction (declared; Sort is not yet supported).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Aggregation function (declared; Aggregate is not yet supported).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationFunction {
    /// Sum of the target field.
    Sum,
    /// Mean of the target field.
    Avg,
    /// Row count per group.
    Count,
}

/// A field-expression pair (declared; Map is not yet supported).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapField {
    /// The output column name.
    pub key: String,
    /// The expression source text.
    pub expression: String,
}

/// The transformation-specific parameters of a node, a closed tagged union.
///
/// Dispatch over this enum is exhaustive; there is deliberately no default
/// branch that passes data through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransformConfig {
    /// Filter rows by a boolean condition tree.
    Filter {
        /// The root group of the condition tree.
        rules: FilterGroup,
    },
    /// Per-row field expressions. Declared but not yet supported.
    Map {
        /// The output fields and their expressions.
        fields: Vec<MapField>,
    },
    /// Two-input relational join.
    #[serde(rename_all = "camelCase")]
    Join {
        /// Inner, left or right.
        join_type: JoinType,
        /// The join key on the left input.
        left_field: String,
        /// The join key on the right input.
        right_field: String,
    },
    /// Group-by aggregation. Declared but not yet supported.
    #[serde(rename_all = "camelCase")]
    Aggregate {
        /// The column to group by.
        group_by_field: String,
        /// The aggregation to apply.
        aggregation_function: AggregationFunction,
        /// The column the aggregation reads.
        target_field: String,
    },
    /// Row ordering. Declared but not yet supported.
    Sort {
        /// The column to order by.
        field: String,
        /// The direction.
        order: SortOrder,
    },
    /// Column projection.
    Select {
        /// The columns to keep, in output order.
        fields: Vec<String>,
    },
}

impl TransformConfig {
    /// The config seeded when a node of the given kind is placed on the
    /// canvas, or `None` for kinds the editor does not pre-configure.
    #[must_use]
    pub fn default_for(kind: TransformKind) -> Option<Self> {
        match kind {
            TransformKind::Filter => Some(Self::Filter {
                rules: FilterGroup::empty_and(),
            }),
            TransformKind::Join => Some(Self::Join {
                join_type: JoinType::Inner,
                left_field: String::new(),
                right_field: String::new(),
            }),
            TransformKind::Map => Some(Self::Map { fields: Vec::new() }),
            TransformKind::Select => Some(Self::Select { fields: Vec::new() }),
            TransformKind::Sort | TransformKind::Aggregate => None,
        }
    }

    /// Returns true if this is a two-input Join config.
    #[must_use]
    pub fn is_join(&self) -> bool {
        matches!(self, Self::Join { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_filter_config_wire_format() {
        let raw = json!({
            "type": "Filter",
            "rules": {
                "operator": "AND",
                "conditions": [
                    { "type": "Rule", "field": "age", "condition": "GreaterThan", "value": 21 },
                    {
                        "type": "Group",
                        "operator": "OR",
                        "conditions": [
                            { "type": "Rule", "field": "name", "condition": "Equals", "value": "Alice" }
                        ]
                    }
                ]
            }
        });

        let config: TransformConfig = serde_json::from_value(raw).unwrap();
        let TransformConfig::Filter { rules } = &config else {
            panic!("expected a Filter config");
        };
        assert_eq!(rules.operator, GroupOperator::AND);
        assert_eq!(rules.conditions.len(), 2);
    }

    #[test]
    fn test_join_config_wire_format() {
        let raw = json!({
            "type": "Join",
            "joinType": "inner",
            "leftField": "id",
            "rightField": "userId"
        });

        let config: TransformConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(
            config,
            TransformConfig::Join {
                join_type: JoinType::Inner,
                left_field: "id".to_string(),
                right_field: "userId".to_string(),
            }
        );
        assert!(config.is_join());

        let round_trip = serde_json::to_value(&config).unwrap();
        assert_eq!(round_trip["joinType"], "inner");
    }

    #[test]
    fn test_unknown_condition_is_rejected() {
        let raw = json!({
            "type": "Rule",
            "field": "age",
            "condition": "Contains",
            "value": 1
        });
        assert!(serde_json::from_value::<FilterCondition>(raw).is_err());
    }

    #[test]
    fn test_default_configs() {
        let config = TransformConfig::default_for(TransformKind::Filter).unwrap();
        let TransformConfig::Filter { rules } = config else {
            panic!("expected a Filter config");
        };
        assert_eq!(rules.operator, GroupOperator::AND);
        assert!(rules.conditions.is_empty());

        assert!(TransformConfig::default_for(TransformKind::Sort).is_none());
        assert!(matches!(
            TransformConfig::default_for(TransformKind::Join),
            Some(TransformConfig::Join {
                join_type: JoinType::Inner,
                ..
            })
        ));
    }
}
