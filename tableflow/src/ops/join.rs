//! The Join operator: combine two input tables on a single key pair.
//!
//! Field names occurring on both sides (other than the join keys) are
//! disambiguated with `left_`/`right_` prefixes; join keys and
//! non-conflicting fields keep their original names.

use super::config::JoinType;
use super::TransformResult;
use crate::errors::EvalError;
use crate::table::{strict_eq, Row, RowTable};
use serde_json::Value;

const LEFT_PREFIX: &str = "left_";
const RIGHT_PREFIX: &str = "right_";

/// Joins `left` and `right` on `left[left_field] === right[right_field]`.
pub(crate) fn apply(
    join_type: JoinType,
    left_field: &str,
    right_field: &str,
    left: &RowTable,
    right: &RowTable,
) -> Result<TransformResult, EvalError> {
    if left_field.is_empty() || right_field.is_empty() {
        return Err(EvalError::configuration(
            "keys are required to perform join operation",
        ));
    }

    let all_left_keys = left.fields();
    let all_right_keys = right.fields();

    // Common keys get prefixed; the join keys themselves never do.
    let common_keys: Vec<&String> = all_left_keys
        .iter()
        .filter(|key| {
            all_right_keys.contains(key) && key.as_str() != left_field && key.as_str() != right_field
        })
        .collect();

    let is_common = |key: &str| common_keys.iter().any(|k| k.as_str() == key);

    let resolve_fields = |item: Option<&Row>, keys: &[String], prefix: &str| -> Vec<(String, Value)> {
        keys.iter()
            .map(|key| {
                let resolved = if is_common(key) {
                    format!("{prefix}{key}")
                } else {
                    key.clone()
                };
                let value = item
                    .and_then(|row| row.get(key))
                    .cloned()
                    .unwrap_or(Value::Null);
                (resolved, value)
            })
            .collect()
    };

    let rows_match = |left_row: &Row, right_row: &Row| {
        let lhs = left_row.get(left_field).unwrap_or(&Value::Null);
        let rhs = right_row.get(right_field).unwrap_or(&Value::Null);
        strict_eq(lhs, rhs)
    };

    let emit = |left_item: Option<&Row>, right_item: Option<&Row>| -> Row {
        let mut row = Row::new();
        for (key, value) in resolve_fields(left_item, &all_left_keys, LEFT_PREFIX) {
            row.insert(key, value);
        }
        for (key, value) in resolve_fields(right_item, &all_right_keys, RIGHT_PREFIX) {
            row.insert(key, value);
        }
        row
    };

    let mut output = RowTable::new();

    match join_type {
        JoinType::Inner | JoinType::Left => {
            for left_row in left {
                let matches: Vec<&Row> =
                    right.iter().filter(|r| rows_match(left_row, r)).collect();
                if matches.is_empty() {
                    if join_type == JoinType::Left {
                        output.push(emit(Some(left_row), None));
                    }
                } else {
                    for right_row in matches {
                        output.push(emit(Some(left_row), Some(right_row)));
                    }
                }
            }
        }
        JoinType::Right => {
            for right_row in right {
                let matches: Vec<&Row> =
                    left.iter().filter(|l| rows_match(l, right_row)).collect();
                if matches.is_empty() {
                    output.push(emit(None, Some(right_row)));
                } else {
                    for left_row in matches {
                        output.push(emit(Some(left_row), Some(right_row)));
                    }
                }
            }
        }
    }

    // Prefixed union of both sides' columns, left side first.
    let fields = all_left_keys
        .iter()
        .map(|key| {
            if is_common(key) {
                format!("{LEFT_PREFIX}{key}")
            } else {
                key.clone()
            }
        })
        .chain(all_right_keys.iter().map(|key| {
            if is_common(key) {
                format!("{RIGHT_PREFIX}{key}")
            } else {
                key.clone()
            }
        }))
        .collect();

    Ok(TransformResult { fields, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rows(values: Vec<serde_json::Value>) -> RowTable {
        RowTable::from_rows(
            values
                .into_iter()
                .map(|v| v.as_object().cloned().unwrap())
                .collect(),
        )
    }

    fn users() -> RowTable {
        rows(vec![
            json!({"id": 1, "name": "Alice"}),
            json!({"id": 2, "name": "Bob"}),
            json!({"id": 3, "name": "Charlie"}),
        ])
    }

    fn ages() -> RowTable {
        rows(vec![
            json!({"userId": 1, "age": 25}),
            json!({"userId": 3, "age": 30}),
            json!({"userId": 4, "age": 40}),
        ])
    }

    #[test]
    fn test_inner_join() {
        let result = apply(JoinType::Inner, "id", "userId", &users(), &ages()).unwrap();
        assert_eq!(
            result.output,
            rows(vec![
                json!({"id": 1, "name": "Alice", "userId": 1, "age": 25}),
                json!({"id": 3, "name": "Charlie", "userId": 3, "age": 30}),
            ])
        );
    }

    #[test]
    fn test_left_join() {
        let result = apply(JoinType::Left, "id", "userId", &users(), &ages()).unwrap();
        assert_eq!(
            result.output,
            rows(vec![
                json!({"id": 1, "name": "Alice", "userId": 1, "age": 25}),
                json!({"id": 2, "name": "Bob", "userId": null, "age": null}),
                json!({"id": 3, "name": "Charlie", "userId": 3, "age": 30}),
            ])
        );
    }

    #[test]
    fn test_right_join() {
        let result = apply(JoinType::Right, "id", "userId", &users(), &ages()).unwrap();
        assert_eq!(
            result.output,
            rows(vec![
                json!({"id": 1, "name": "Alice", "userId": 1, "age": 25}),
                json!({"id": 3, "name": "Charlie", "userId": 3, "age": 30}),
                json!({"id": null, "name": null, "userId": 4, "age": 40}),
            ])
        );
    }

    #[test]
    fn test_conflicting_field_names_get_prefixed() {
        let left = rows(vec![
            json!({"id": 1, "name": "Alice", "age": 22}),
            json!({"id": 2, "name": "Bob", "age": 30}),
            json!({"id": 3, "name": "Charlie", "age": 40}),
        ]);
        let right = rows(vec![
            json!({"userId": 1, "name": "Alice", "salary": 5000}),
            json!({"userId": 3, "name": "Charlie", "salary": 7000}),
            json!({"userId": 4, "name": "David", "salary": 8000}),
        ]);

        let result = apply(JoinType::Left, "id", "userId", &left, &right).unwrap();
        assert_eq!(
            result.output,
            rows(vec![
                json!({"id": 1, "left_name": "Alice", "age": 22, "userId": 1, "right_name": "Alice", "salary": 5000}),
                json!({"id": 2, "left_name": "Bob", "age": 30, "userId": null, "right_name": null, "salary": null}),
                json!({"id": 3, "left_name": "Charlie", "age": 40, "userId": 3, "right_name": "Charlie", "salary": 7000}),
            ])
        );
    }

    #[test]
    fn test_reported_fields_are_prefixed_union() {
        let left = rows(vec![json!({"id": 1, "name": "Alice"})]);
        let right = rows(vec![json!({"userId": 1, "name": "A", "age": 9})]);

        let result = apply(JoinType::Inner, "id", "userId", &left, &right).unwrap();
        assert_eq!(
            result.fields,
            vec!["id", "left_name", "userId", "right_name", "age"]
        );
    }

    #[test]
    fn test_missing_keys_fail_with_configuration_error() {
        let err = apply(JoinType::Inner, "", "userId", &users(), &ages()).unwrap_err();
        assert!(matches!(err, EvalError::Configuration(_)));

        let err = apply(JoinType::Inner, "id", "", &users(), &ages()).unwrap_err();
        assert!(matches!(err, EvalError::Configuration(_)));
    }

    #[test]
    fn test_join_key_match_is_strict() {
        let left = rows(vec![json!({"id": "1", "name": "Alice"})]);
        // Number 1 does not strictly equal string "1".
        let result = apply(JoinType::Inner, "id", "userId", &left, &ages()).unwrap();
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_empty_side_yields_keys_from_other_side_only() {
        let result = apply(JoinType::Left, "id", "userId", &users(), &RowTable::new()).unwrap();
        assert_eq!(result.fields, vec!["id", "name"]);
        // Every left row is unmatched; no right-side columns exist to null out.
        assert_eq!(result.output.len(), 3);
        assert_eq!(result.output.rows()[0], *json!({"id": 1, "name": "Alice"}).as_object().unwrap());
    }
}
