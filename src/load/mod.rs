// src/load/mod.rs

use anyhow::{bail, Context, Result};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use std::{fs::File, io::Seek, path::Path, sync::Arc};
use tracing::debug;

/// Rows per batch while reading; batches are concatenated afterwards, so this
/// only bounds transient allocations.
const BATCH_SIZE: usize = 8192;

/// Read a whole CSV file (header row required) into a single record batch.
///
/// Column types are inferred from the entire file, so a column that only
/// turns numeric or empty halfway through still gets one consistent type.
/// Missing cells come back as nulls.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let mut file =
        File::open(path).with_context(|| format!("opening input CSV {}", path.display()))?;

    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(&mut file, None)
        .with_context(|| format!("inferring schema of {}", path.display()))?;
    if schema.fields().is_empty() {
        bail!("{} has no header row", path.display());
    }
    file.rewind()
        .with_context(|| format!("rewinding {}", path.display()))?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(file)
        .with_context(|| format!("creating CSV reader for {}", path.display()))?;

    let batches: Vec<RecordBatch> = reader
        .collect::<Result<_, _>>()
        .with_context(|| format!("reading CSV rows from {}", path.display()))?;

    let batch = arrow::compute::concat_batches(&schema, &batches)
        .with_context(|| format!("concatenating batches from {}", path.display()))?;

    debug!(
        path = %path.display(),
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "loaded CSV"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_fixture(content: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().expect("create temp file");
        tmp.write_all(content.as_bytes()).expect("write fixture");
        tmp
    }

    #[test]
    fn read_csv_infers_column_types() -> Result<()> {
        let tmp = write_fixture(
            "Entity,Code,Year,Greenhouse gas emissions from food\n\
             France,FRA,2015,102058770.0\n\
             United States,USA,2015,670038400.0\n\
             Europe,,2015,1995552300.0\n",
        );

        let batch = read_csv(tmp.path())?;
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 4);

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Int64);
        assert_eq!(schema.field(3).data_type(), &DataType::Float64);

        let entity = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("Entity is a string column");
        assert_eq!(entity.value(1), "United States");

        let year = batch
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("Year is an integer column");
        assert_eq!(year.value(0), 2015);

        let emissions = batch
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("emissions is a float column");
        assert_eq!(emissions.value(2), 1_995_552_300.0);
        Ok(())
    }

    #[test]
    fn read_csv_keeps_missing_cells_as_nulls() -> Result<()> {
        let tmp = write_fixture(
            "Entity,Code,Year,Share of total greenhouse gas emissions that come from food\n\
             France,FRA,2015,21.2\n\
             France,FRA,2016,\n",
        );

        let batch = read_csv(tmp.path())?;
        let share = batch
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("share is a float column");
        assert!(!share.is_null(0));
        assert!(share.is_null(1));
        Ok(())
    }

    #[test]
    fn read_csv_missing_file_reports_path() {
        let err = read_csv("does-not-exist.csv").expect_err("missing file must fail");
        assert!(format!("{:#}", err).contains("does-not-exist.csv"));
    }

    #[test]
    fn read_csv_rejects_ragged_rows() {
        let tmp = write_fixture(
            "Entity,Code,Year\n\
             France,FRA,2015\n\
             United States,USA,2015,extra-field\n",
        );
        assert!(read_csv(tmp.path()).is_err());
    }

    #[test]
    fn read_csv_header_only_gives_empty_table() -> Result<()> {
        let tmp = write_fixture("Entity,Code,Year\n");
        let batch = read_csv(tmp.path())?;
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 3);
        Ok(())
    }
}
