use anyhow::Result;
use foodmerge::pipeline::{self, MergeConfig};
use std::env;
use std::process::exit;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,foodmerge=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) resolve paths ────────────────────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() > 3 {
        eprintln!("Usage: foodmerge [EMISSIONS_CSV] [SHARE_CSV] [OUT_CSV]");
        exit(1);
    }
    let config = MergeConfig::from_args(args);
    info!(
        emissions = %config.emissions_path.display(),
        share = %config.share_path.display(),
        out = %config.out_path.display(),
        "resolved inputs"
    );

    // ─── 3) run the merge ────────────────────────────────────────────
    let summary = pipeline::run(&config)?;
    info!(
        emissions_rows = summary.emissions_rows,
        share_rows = summary.share_rows,
        merged_rows = summary.merged_rows,
        merged_columns = summary.merged_columns,
        bytes_written = summary.bytes_written,
        "all done"
    );
    Ok(())
}
