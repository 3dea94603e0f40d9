// src/merge/mod.rs

pub mod key;

use anyhow::{anyhow, Context, Result};
use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use key::{extract_key, KeyValue};

/// Columns the emissions and food-share datasets are keyed on.
pub const KEY_COLUMNS: [&str; 3] = ["Entity", "Code", "Year"];

/// Inner-join `left` and `right` on the named key columns.
///
/// Classic hash join: index the right table by key tuple, then probe with the
/// left table in row order, so the output follows the left table's order.
/// Duplicate key tuples fan out into the full cross product of their matches,
/// right-side matches in right-table order. Rows with a missing key cell on
/// either side never appear in the output.
///
/// The output carries every left column in order, then the right columns
/// minus the key columns. A non-key name present on both sides comes out as
/// `<name>_x` (left) and `<name>_y` (right).
pub fn inner_join(left: &RecordBatch, right: &RecordBatch, keys: &[&str]) -> Result<RecordBatch> {
    let left_schema = left.schema();
    let right_schema = right.schema();
    let left_key_indices = key_indices(&left_schema, keys, "left")?;
    let right_key_indices = key_indices(&right_schema, keys, "right")?;

    // Build phase: key tuple → right-table row indices, in row order.
    let mut by_key: HashMap<Vec<KeyValue>, Vec<u32>> = HashMap::new();
    let mut skipped_right = 0u64;
    for row in 0..right.num_rows() {
        let key = extract_key(right, &right_key_indices, row)?;
        if key.iter().any(|k| matches!(k, KeyValue::Null)) {
            skipped_right += 1;
            continue;
        }
        by_key.entry(key).or_default().push(row as u32);
    }
    debug!(
        keys = by_key.len(),
        rows = right.num_rows(),
        "indexed right table"
    );

    // Probe phase: walk the left table in order and collect matching pairs.
    let mut left_rows: Vec<u32> = Vec::new();
    let mut right_rows: Vec<u32> = Vec::new();
    let mut skipped_left = 0u64;
    for row in 0..left.num_rows() {
        let key = extract_key(left, &left_key_indices, row)?;
        if key.iter().any(|k| matches!(k, KeyValue::Null)) {
            skipped_left += 1;
            continue;
        }
        if let Some(matches) = by_key.get(&key) {
            for &right_row in matches {
                left_rows.push(row as u32);
                right_rows.push(right_row);
            }
        }
    }
    if skipped_left + skipped_right > 0 {
        warn!(
            left = skipped_left,
            right = skipped_right,
            "rows with missing key values excluded from join"
        );
    }

    // Names shared by both sides outside the key get the _x/_y treatment.
    let key_set: HashSet<&str> = keys.iter().copied().collect();
    let right_names: HashSet<&str> = right_schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    let shared: HashSet<&str> = left_schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .filter(|n| !key_set.contains(n) && right_names.contains(n))
        .collect();

    let width = left.num_columns() + right.num_columns() - keys.len();
    let mut fields: Vec<Field> = Vec::with_capacity(width);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(width);

    let left_indices = UInt32Array::from(left_rows);
    for (i, field) in left_schema.fields().iter().enumerate() {
        let name = if shared.contains(field.name().as_str()) {
            format!("{}_x", field.name())
        } else {
            field.name().clone()
        };
        fields.push(Field::new(&name, field.data_type().clone(), true));
        let taken = compute::take(left.column(i).as_ref(), &left_indices, None)
            .with_context(|| format!("materializing left column {}", field.name()))?;
        columns.push(taken);
    }

    let right_indices = UInt32Array::from(right_rows);
    for (i, field) in right_schema.fields().iter().enumerate() {
        if key_set.contains(field.name().as_str()) {
            continue;
        }
        let name = if shared.contains(field.name().as_str()) {
            format!("{}_y", field.name())
        } else {
            field.name().clone()
        };
        fields.push(Field::new(&name, field.data_type().clone(), true));
        let taken = compute::take(right.column(i).as_ref(), &right_indices, None)
            .with_context(|| format!("materializing right column {}", field.name()))?;
        columns.push(taken);
    }

    let merged = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("assembling joined batch")?;
    debug!(rows = merged.num_rows(), columns = merged.num_columns(), "join complete");
    Ok(merged)
}

fn key_indices(schema: &Schema, keys: &[&str], side: &str) -> Result<Vec<usize>> {
    keys.iter()
        .map(|&name| {
            schema
                .index_of(name)
                .map_err(|_| anyhow!("key column '{}' missing from {} input", name, side))
        })
        .collect()
}
