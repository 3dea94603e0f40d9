use anyhow::{anyhow, Context, Result};
use foodmerge::pipeline::{EMISSIONS_CSV, MERGED_CSV, SHARE_CSV};
use std::collections::HashMap;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

const KEY_COLUMNS: [&str; 3] = ["Entity", "Code", "Year"];

/// One CSV file reduced to the parts the checks need.
struct KeyedCsv {
    columns: usize,
    rows: usize,
    keys: Vec<Vec<String>>,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr) // keep stdout for the tables
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() > 3 {
        eprintln!("Usage: verify_merge [EMISSIONS_CSV] [SHARE_CSV] [MERGED_CSV]");
        std::process::exit(1);
    }
    let emissions_path = args.first().map(String::as_str).unwrap_or(EMISSIONS_CSV);
    let share_path = args.get(1).map(String::as_str).unwrap_or(SHARE_CSV);
    let merged_path = args.get(2).map(String::as_str).unwrap_or(MERGED_CSV);

    // 1) Re-read all three files with an untyped CSV reader.
    let emissions = read_keyed_rows(Path::new(emissions_path))?;
    let share = read_keyed_rows(Path::new(share_path))?;
    let merged = read_keyed_rows(Path::new(merged_path))?;

    println!("\n{: <40} {:>10} {:>10}", "File", "Rows", "Columns");
    println!("{:-<62}", "");
    println!(
        "{: <40} {:>10} {:>10}",
        emissions_path, emissions.rows, emissions.columns
    );
    println!("{: <40} {:>10} {:>10}", share_path, share.rows, share.columns);
    println!(
        "{: <40} {:>10} {:>10}",
        merged_path, merged.rows, merged.columns
    );

    // 2) Tally key multiplicities on both input sides.
    let mut emissions_counts: HashMap<&[String], usize> = HashMap::new();
    for key in &emissions.keys {
        *emissions_counts.entry(key.as_slice()).or_default() += 1;
    }
    let mut share_counts: HashMap<&[String], usize> = HashMap::new();
    for key in &share.keys {
        *share_counts.entry(key.as_slice()).or_default() += 1;
    }

    // 3) Replay the join arithmetic: keys on both sides multiply out,
    //    and key columns appear once in the merged header.
    let expected_rows: usize = emissions_counts
        .iter()
        .map(|(key, count)| count * share_counts.get(key).copied().unwrap_or(0))
        .sum();
    let expected_columns = emissions.columns + share.columns - KEY_COLUMNS.len();

    // 4) Every merged row must trace back to both inputs and carry a full key.
    let foreign_rows = merged
        .keys
        .iter()
        .filter(|key| {
            !emissions_counts.contains_key(key.as_slice())
                || !share_counts.contains_key(key.as_slice())
        })
        .count();
    let unkeyed_rows = merged.rows - merged.keys.len();

    // 5) Summary table.
    println!("\n{: <40} {:>10} {:>10}", "Check", "Actual", "Expected");
    println!("{:-<62}", "");
    println!(
        "{: <40} {:>10} {:>10}",
        "merged rows", merged.rows, expected_rows
    );
    println!(
        "{: <40} {:>10} {:>10}",
        "merged columns", merged.columns, expected_columns
    );
    println!(
        "{: <40} {:>10} {:>10}",
        "merged rows missing from an input", foreign_rows, 0
    );
    println!(
        "{: <40} {:>10} {:>10}",
        "merged rows with empty key cells", unkeyed_rows, 0
    );

    if merged.rows != expected_rows
        || merged.columns != expected_columns
        || foreign_rows != 0
        || unkeyed_rows != 0
    {
        return Err(anyhow!("merged output does not line up with its inputs"));
    }
    println!("\nmerged output agrees with both inputs");
    Ok(())
}

/// Read one CSV and collect the normalized `(Entity, Code, Year)` key of
/// every row that has all three cells populated.
fn read_keyed_rows(path: &Path) -> Result<KeyedCsv> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let key_indices = locate_key_columns(&header, path)?;

    let mut rows = 0usize;
    let mut keys = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        rows += 1;
        if let Some(key) = row_key(&record, &key_indices) {
            keys.push(key);
        }
    }
    Ok(KeyedCsv {
        columns: header.len(),
        rows,
        keys,
    })
}

fn locate_key_columns(header: &[String], path: &Path) -> Result<[usize; 3]> {
    let mut indices = [0usize; 3];
    for (slot, name) in KEY_COLUMNS.iter().enumerate() {
        indices[slot] = header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| anyhow!("{} has no '{}' column", path.display(), name))?;
    }
    Ok(indices)
}

fn row_key(record: &csv::StringRecord, indices: &[usize; 3]) -> Option<Vec<String>> {
    let mut key = Vec::with_capacity(indices.len());
    for &index in indices {
        key.push(normalize_key_cell(record.get(index)?)?);
    }
    Some(key)
}

/// Integral numerics compare equal across int and float renderings, so
/// "2010.0" and "2010" map to the same key. Blank cells carry no key.
fn normalize_key_cell(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(value) = cell.parse::<f64>() {
        if value.is_nan() {
            return None;
        }
        if value.fract() == 0.0 && value.abs() <= 9_007_199_254_740_992.0 {
            return Some(format!("{}", value as i64));
        }
    }
    Some(cell.to_string())
}
