// src/merge/key.rs

use anyhow::{anyhow, Result};
use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

/// One key cell, lifted out of its Arrow array so tuples from the two inputs
/// hash and compare against each other regardless of how each file was typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// Missing cell: Arrow null, an empty string, or a NaN. Never matches.
    Null,
    Int(i64),
    Str(String),
    Bool(bool),
    /// Non-integral float, kept bit-exact.
    Float(u64),
}

/// Largest magnitude a float can hold while still round-tripping through i64.
const MAX_EXACT_INT_F64: f64 = 9_007_199_254_740_992.0; // 2^53

/// Extract the key tuple for `row` from the columns at `indices`.
///
/// Integral floats collapse to `Int`, so a file that serialized `Year` as
/// `2010.0` still joins against one that wrote `2010`.
pub fn extract_key(batch: &RecordBatch, indices: &[usize], row: usize) -> Result<Vec<KeyValue>> {
    indices
        .iter()
        .map(|&idx| {
            let column = batch.column(idx);
            if column.is_null(row) {
                return Ok(KeyValue::Null);
            }
            if let Some(arr) = column.as_any().downcast_ref::<StringArray>() {
                let value = arr.value(row);
                return Ok(if value.trim().is_empty() {
                    KeyValue::Null
                } else {
                    KeyValue::Str(value.to_string())
                });
            }
            if let Some(arr) = column.as_any().downcast_ref::<Int64Array>() {
                return Ok(KeyValue::Int(arr.value(row)));
            }
            if let Some(arr) = column.as_any().downcast_ref::<Float64Array>() {
                return Ok(float_key(arr.value(row)));
            }
            if let Some(arr) = column.as_any().downcast_ref::<BooleanArray>() {
                return Ok(KeyValue::Bool(arr.value(row)));
            }
            // Dates, timestamps and whatever else inference may produce:
            // compare by their rendered form.
            let rendered = array_value_to_string(column, row).map_err(|e| {
                anyhow!(
                    "rendering key value at row {} of column {}: {}",
                    row,
                    batch.schema().field(idx).name(),
                    e
                )
            })?;
            Ok(KeyValue::Str(rendered))
        })
        .collect()
}

fn float_key(value: f64) -> KeyValue {
    if value.is_nan() {
        KeyValue::Null
    } else if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INT_F64 {
        KeyValue::Int(value as i64)
    } else {
        KeyValue::Float(value.to_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn key_batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("Entity", DataType::Utf8, true),
            Field::new("Code", DataType::Utf8, true),
            Field::new("Year", DataType::Float64, true),
        ]);
        let entity = StringArray::from(vec![Some("France"), Some("Europe"), None]);
        let code = StringArray::from(vec![Some("FRA"), Some(""), Some("  ")]);
        let year = Float64Array::from(vec![Some(2015.0), Some(2015.5), Some(f64::NAN)]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(entity), Arc::new(code), Arc::new(year)],
        )
        .expect("build key batch")
    }

    #[test]
    fn integral_floats_collapse_to_int() -> Result<()> {
        let batch = key_batch();
        let key = extract_key(&batch, &[0, 1, 2], 0)?;
        assert_eq!(
            key,
            vec![
                KeyValue::Str("France".into()),
                KeyValue::Str("FRA".into()),
                KeyValue::Int(2015),
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_and_whitespace_strings_are_missing() -> Result<()> {
        let batch = key_batch();
        let row1 = extract_key(&batch, &[1], 1)?;
        let row2 = extract_key(&batch, &[1], 2)?;
        assert_eq!(row1, vec![KeyValue::Null]);
        assert_eq!(row2, vec![KeyValue::Null]);
        Ok(())
    }

    #[test]
    fn nulls_and_nans_are_missing() -> Result<()> {
        let batch = key_batch();
        assert_eq!(extract_key(&batch, &[0], 2)?, vec![KeyValue::Null]);
        assert_eq!(extract_key(&batch, &[2], 2)?, vec![KeyValue::Null]);
        Ok(())
    }

    #[test]
    fn fractional_floats_stay_floats() -> Result<()> {
        let batch = key_batch();
        assert_eq!(
            extract_key(&batch, &[2], 1)?,
            vec![KeyValue::Float(2015.5f64.to_bits())]
        );
        Ok(())
    }
}
