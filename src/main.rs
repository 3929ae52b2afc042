use anyhow::Context;
use clap::Parser;
use hexview::{Config, HexDocument};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Print rows of a large file in hex without loading the whole file
#[derive(Parser, Debug)]
#[command(name = "hexview", version, about)]
struct Args {
    /// File to view
    file: PathBuf,

    /// Offset to start at (decimal, or hex with a 0x prefix)
    #[arg(short, long, default_value = "0", value_parser = parse_offset)]
    offset: u64,

    /// Number of rows to print
    #[arg(short, long)]
    rows: Option<usize>,

    /// Chunk size in bytes
    #[arg(long)]
    chunk_size: Option<u64>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_offset(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid offset '{}': {}", s, e))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(rows) = args.rows {
        config.visible_rows = rows;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let mut document = HexDocument::open(&args.file, config, runtime.handle().clone())?;
    document.init();
    document.scroll_to_offset(args.offset);
    if !document.wait_until_idle() {
        tracing::warn!(
            "timed out waiting for {} chunks",
            document.handler().pending_chunks().len()
        );
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in document.visible_lines() {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    Ok(())
}
