// src/schema/mod.rs

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shape of one column of a loaded table, as reported by `inspect_csv`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ColumnProfile {
    pub name: String,
    pub data_type: String,
    pub nulls: usize,
    pub distinct: usize,
}

/// Profile every column of `batch`: inferred type, null count, distinct
/// count (distinct over the rendered values, nulls not counted).
pub fn profile(batch: &RecordBatch) -> Vec<ColumnProfile> {
    batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let column = batch.column(i);
            let mut nulls = 0usize;
            let mut seen: HashSet<String> = HashSet::new();
            for row in 0..column.len() {
                if column.is_null(row) {
                    nulls += 1;
                } else if let Ok(rendered) = array_value_to_string(column, row) {
                    seen.insert(rendered);
                }
            }
            ColumnProfile {
                name: field.name().clone(),
                data_type: field.data_type().to_string(),
                nulls,
                distinct: seen.len(),
            }
        })
        .collect()
}
