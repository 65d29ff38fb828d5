use serde_json::Value;
use tracing::warn;

use super::RecordMap;

/// A positional result set: column names plus rows of values in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Key every row of a positional result set by column name.
///
/// A result set without columns yields no records. Rows whose arity does not
/// match the column list are skipped.
pub fn row_to_mapping(result: RawResultSet) -> Vec<RecordMap> {
    if result.columns.is_empty() {
        return Vec::new();
    }

    let expected = result.columns.len();
    let mut records = Vec::with_capacity(result.rows.len());

    for (index, row) in result.rows.into_iter().enumerate() {
        if row.len() != expected {
            warn!(
                row = index,
                expected,
                actual = row.len(),
                "Skipping row with mismatched column count"
            );
            continue;
        }
        records.push(result.columns.iter().cloned().zip(row).collect());
    }

    records
}
