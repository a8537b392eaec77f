//! Row-oriented tabular values and the scalar comparison semantics used by
//! the transformation operators.
//!
//! A [`Row`] maps column names to JSON scalars; a [`RowTable`] is an ordered
//! sequence of rows. Rows within a table need not share identical column
//! sets, but the first row's keys define the schema for display and field
//! extraction.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single row: column name to scalar value, in insertion order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// An ordered sequence of column-keyed rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowTable {
    rows: Vec<Row>,
}

impl RowTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Creates a table from a vector of rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Returns the column names of the first row, or an empty list for an
    /// empty table.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Iterates over the rows in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Returns the rows as a slice.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the table, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl From<Vec<Row>> for RowTable {
    fn from(rows: Vec<Row>) -> Self {
        Self::from_rows(rows)
    }
}

impl FromIterator<Row> for RowTable {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::from_rows(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RowTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn as_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn coerce_to_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}

/// Loose equality, the semantics of a filter rule's `Equals` condition.
///
/// Numbers compare numerically regardless of integer or float
/// representation, a numeric string compares equal to the number it parses
/// to, and null equals null.
#[must_use]
pub fn loose_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value;

    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(_), Value::Number(_))
        | (Value::Number(_), Value::String(_) | Value::Bool(_))
        | (Value::String(_) | Value::Bool(_), Value::Number(_)) => {
            match (coerce_to_number(a), coerce_to_number(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Strict equality, the semantics of the join match predicate.
///
/// Both sides must have the same JSON type; numbers still compare
/// numerically since the source language has a single number type.
#[must_use]
pub fn strict_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value;

    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(_), Value::Number(_)) => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => false,
    }
}

/// Relational comparison, the semantics of `GreaterThan` / `LessThan`.
///
/// Numeric when both sides are (or coerce to) numbers, lexicographic for two
/// strings, and `None` for incomparable operands; a relational rule over
/// incomparable values is simply false for that row.
#[must_use]
pub fn compare(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    use serde_json::Value;

    match (a, b) {
        // Two strings compare lexicographically, even when both are numeric.
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => {
            let x = coerce_to_number(a)?;
            let y = coerce_to_number(b)?;
            x.partial_cmp(&y)
        }
    }
}
