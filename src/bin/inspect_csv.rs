use anyhow::Result;
use foodmerge::{load, schema};
use std::{env, fs, path::Path, process::exit};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr) // keep stdout for the report
        .init();

    // Expect a CSV path, plus an optional --json flag.
    let mut json = false;
    let mut paths: Vec<String> = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            paths.push(arg);
        }
    }
    if paths.len() != 1 {
        eprintln!("Usage: inspect_csv <CSV_FILE> [--json]");
        exit(1);
    }
    if let Err(e) = inspect_csv(Path::new(&paths[0]), json) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Load the CSV, profile every column, and print the result.
fn inspect_csv(path: &Path, json: bool) -> Result<()> {
    let batch = load::read_csv(path)?;
    let profiles = schema::profile(&batch);

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    let file_size_disk = fs::metadata(path)?.len();

    println!("=== CSV File: {} ===", path.display());
    println!("Total rows:        {}", batch.num_rows());
    println!("Number of columns: {}", batch.num_columns());
    println!("File size on disk: {} bytes", file_size_disk);
    println!();

    println!("=== Columns ===");
    for profile in &profiles {
        println!(
            "- {:<60} | Type: {:<8} | Nulls: {:>6} | Distinct: {:>6}",
            profile.name, profile.data_type, profile.nulls, profile.distinct
        );
    }

    Ok(())
}
