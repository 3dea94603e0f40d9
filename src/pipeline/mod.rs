// src/pipeline/mod.rs

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::{load, merge, write};

/// Default file names, resolved against the working directory.
pub const EMISSIONS_CSV: &str = "emissions-from-food.csv";
pub const SHARE_CSV: &str = "food-share-total-emissions.csv";
pub const MERGED_CSV: &str = "merged_emissions_and_food_share_data.csv";

/// Where the pipeline reads from and writes to.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub emissions_path: PathBuf,
    pub share_path: PathBuf,
    pub out_path: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            emissions_path: EMISSIONS_CSV.into(),
            share_path: SHARE_CSV.into(),
            out_path: MERGED_CSV.into(),
        }
    }
}

impl MergeConfig {
    /// Override the default paths from leading positional arguments, in
    /// emissions / share / output order.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();
        if let Some(path) = args.next() {
            config.emissions_path = path.into();
        }
        if let Some(path) = args.next() {
            config.share_path = path.into();
        }
        if let Some(path) = args.next() {
            config.out_path = path.into();
        }
        config
    }
}

/// What a completed run looked like.
#[derive(Debug, Serialize)]
pub struct MergeSummary {
    pub emissions_rows: usize,
    pub share_rows: usize,
    pub merged_rows: usize,
    pub merged_columns: usize,
    pub bytes_written: u64,
}

/// Load both datasets, inner-join them on `(Entity, Code, Year)`, and write
/// the merged CSV.
#[tracing::instrument(level = "info", skip(config), fields(out = %config.out_path.display()))]
pub fn run(config: &MergeConfig) -> Result<MergeSummary> {
    let start = Instant::now();

    let emissions = load::read_csv(&config.emissions_path).context("loading emissions dataset")?;
    info!(
        rows = emissions.num_rows(),
        columns = emissions.num_columns(),
        "emissions dataset loaded"
    );

    let share = load::read_csv(&config.share_path).context("loading food-share dataset")?;
    info!(
        rows = share.num_rows(),
        columns = share.num_columns(),
        "food-share dataset loaded"
    );

    let merged = merge::inner_join(&emissions, &share, &merge::KEY_COLUMNS)
        .context("joining datasets on (Entity, Code, Year)")?;
    info!(rows = merged.num_rows(), "datasets joined");

    let bytes_written = write::write_csv(&merged, &config.out_path)
        .with_context(|| format!("writing merged output {}", config.out_path.display()))?;

    info!(elapsed = ?start.elapsed(), "merge pipeline completed");
    Ok(MergeSummary {
        emissions_rows: emissions.num_rows(),
        share_rows: share.num_rows(),
        merged_rows: merged.num_rows(),
        merged_columns: merged.num_columns(),
        bytes_written,
    })
}
