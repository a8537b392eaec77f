//! The Select operator: project each row onto the named columns.

use super::TransformResult;
use crate::table::{Row, RowTable};

/// Projects each input row onto `fields`, in the given order. A field the
/// row does not carry is simply absent from the output row rather than
/// failing the projection.
///
/// The reported `fields` echo the input's full column set, reproducing the
/// behaviour of the editor this engine backs.
#[must_use]
pub(crate) fn apply(fields: &[String], input: &RowTable) -> TransformResult {
    let output: RowTable = input
        .iter()
        .map(|row| {
            let mut projected = Row::new();
            for field in fields {
                if let Some(value) = row.get(field) {
                    projected.insert(field.clone(), value.clone());
                }
            }
            projected
        })
        .collect();

    TransformResult {
        fields: input.fields(),
        output,
    }
}
