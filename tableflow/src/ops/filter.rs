//! The Filter operator: keep the input rows for which a boolean condition
//! tree evaluates true, preserving input order.

use super::config::{FilterCondition, FilterGroup, FilterRule, GroupOperator, RuleCondition};
use super::TransformResult;
use crate::table::{compare, loose_eq, Row, RowTable};
use std::cmp::Ordering;

/// Applies a filter condition tree to a single input table.
#[must_use]
pub(crate) fn apply(rules: &FilterGroup, input: &RowTable) -> TransformResult {
    let output: RowTable = input
        .iter()
        .filter(|row| eval_group(rules, row))
        .cloned()
        .collect();

    TransformResult {
        fields: input.fields(),
        output,
    }
}

fn eval_group(group: &FilterGroup, row: &Row) -> bool {
    match group.operator {
        GroupOperator::AND => group.conditions.iter().all(|c| eval_condition(c, row)),
        GroupOperator::OR => group.conditions.iter().any(|c| eval_condition(c, row)),
    }
}

fn eval_condition(condition: &FilterCondition, row: &Row) -> bool {
    match condition {
        FilterCondition::Rule(rule) => eval_rule(rule, row),
        FilterCondition::Group(group) => eval_group(group, row),
    }
}

fn eval_rule(rule: &FilterRule, row: &Row) -> bool {
    // A missing field reads as null.
    let actual = row.get(&rule.field).unwrap_or(&serde_json::Value::Null);

    match rule.condition {
        RuleCondition::Equals => loose_eq(actual, &rule.value),
        RuleCondition::NotEquals => !loose_eq(actual, &rule.value),
        RuleCondition::GreaterThan => compare(actual, &rule.value) == Some(Ordering::Greater),
        RuleCondition::LessThan => compare(actual, &rule.value) == Some(Ordering::Less),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn people() -> RowTable {
        RowTable::from_rows(
            [
                json!({"name": "Alice", "age": 25, "city": "Berlin"}),
                json!({"name": "Bob", "age": 17, "city": "Paris"}),
                json!({"name": "Charlie", "age": 30, "city": "Berlin"}),
            ]
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect(),
        )
    }

    fn rule(field: &str, condition: RuleCondition, value: serde_json::Value) -> FilterCondition {
        FilterCondition::Rule(FilterRule {
            field: field.to_string(),
            condition,
            value,
        })
    }

    fn group(operator: GroupOperator, conditions: Vec<FilterCondition>) -> FilterGroup {
        FilterGroup {
            operator,
            conditions,
        }
    }

    fn names(result: &TransformResult) -> Vec<&str> {
        result
            .output
            .iter()
            .map(|r| r.get("name").and_then(|v| v.as_str()).unwrap())
            .collect()
    }

    #[test]
    fn test_equals() {
        let rules = group(
            GroupOperator::AND,
            vec![rule("city", RuleCondition::Equals, json!("Berlin"))],
        );
        let result = apply(&rules, &people());
        assert_eq!(names(&result), vec!["Alice", "Charlie"]);
    }

    #[test]
    fn test_not_equals() {
        let rules = group(
            GroupOperator::AND,
            vec![rule("city", RuleCondition::NotEquals, json!("Berlin"))],
        );
        let result = apply(&rules, &people());
        assert_eq!(names(&result), vec!["Bob"]);
    }

    #[test]
    fn test_greater_and_less_than() {
        let rules = group(
            GroupOperator::AND,
            vec![rule("age", RuleCondition::GreaterThan, json!(18))],
        );
        assert_eq!(names(&apply(&rules, &people())), vec!["Alice", "Charlie"]);

        let rules = group(
            GroupOperator::AND,
            vec![rule("age", RuleCondition::LessThan, json!(26))],
        );
        assert_eq!(names(&apply(&rules, &people())), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_and_requires_all_children() {
        let rules = group(
            GroupOperator::AND,
            vec![
                rule("city", RuleCondition::Equals, json!("Berlin")),
                rule("age", RuleCondition::GreaterThan, json!(26)),
            ],
        );
        assert_eq!(names(&apply(&rules, &people())), vec!["Charlie"]);
    }

    #[test]
    fn test_or_requires_any_child() {
        let rules = group(
            GroupOperator::OR,
            vec![
                rule("age", RuleCondition::LessThan, json!(18)),
                rule("age", RuleCondition::GreaterThan, json!(26)),
            ],
        );
        assert_eq!(names(&apply(&rules, &people())), vec!["Bob", "Charlie"]);
    }

    #[test]
    fn test_nested_groups() {
        // city == Berlin AND (age < 26 OR age > 29)
        let rules = group(
            GroupOperator::AND,
            vec![
                rule("city", RuleCondition::Equals, json!("Berlin")),
                FilterCondition::Group(Box::new(group(
                    GroupOperator::OR,
                    vec![
                        rule("age", RuleCondition::LessThan, json!(26)),
                        rule("age", RuleCondition::GreaterThan, json!(29)),
                    ],
                ))),
            ],
        );
        assert_eq!(names(&apply(&rules, &people())), vec!["Alice", "Charlie"]);
    }

    #[test]
    fn test_empty_and_group_keeps_everything() {
        let result = apply(&FilterGroup::empty_and(), &people());
        assert_eq!(result.output.len(), 3);
    }

    #[test]
    fn test_empty_or_group_keeps_nothing() {
        let rules = group(GroupOperator::OR, vec![]);
        let result = apply(&rules, &people());
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_loose_equality_against_numeric_string() {
        let rules = group(
            GroupOperator::AND,
            vec![rule("age", RuleCondition::Equals, json!("25"))],
        );
        assert_eq!(names(&apply(&rules, &people())), vec!["Alice"]);
    }

    #[test]
    fn test_fields_echo_input_columns() {
        let rules = group(
            GroupOperator::AND,
            vec![rule("age", RuleCondition::GreaterThan, json!(100))],
        );
        let result = apply(&rules, &people());
        // No surviving rows, but the reported fields come from the input.
        assert!(result.output.is_empty());
        assert_eq!(result.fields, vec!["name", "age", "city"]);
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let rules = group(
            GroupOperator::AND,
            vec![rule("salary", RuleCondition::GreaterThan, json!(0))],
        );
        assert!(apply(&rules, &people()).output.is_empty());
    }
}
