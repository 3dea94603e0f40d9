// src/write/mod.rs

use anyhow::{Context, Result};
use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Serialize `batch` as CSV at `path`: one header line, one line per row,
/// nulls as empty fields, no row-index column.
///
/// The bytes land in a sibling `.tmp` file first and are renamed into place,
/// so a failed run never leaves a truncated file at the destination.
/// Returns the number of bytes written.
pub fn write_csv<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<u64> {
    let path = path.as_ref();

    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
        writer
            .write(batch)
            .with_context(|| format!("serializing CSV rows for {}", path.display()))?;
    }

    let temp_path = path.with_extension("tmp");
    if let Err(e) = fs::write(&temp_path, &buf) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("creating {}", temp_path.display()));
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| {
            format!(
                "renaming {} to {}",
                temp_path.display(),
                path.display()
            )
        });
    }

    debug!(
        path = %path.display(),
        rows = batch.num_rows(),
        bytes = buf.len(),
        "wrote CSV"
    );
    Ok(buf.len() as u64)
}
