// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use epdprep_core::epd::extract_stream;
use epdprep_tools::{init_logging, open_input, open_output, parse_args};
use std::path::PathBuf;

/// Print one EPD line per main-line ply of every game, annotated with the
/// move played from the position
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PGN file, or - for standard input
    pgn: String,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Args = parse_args();
    init_logging(args.verbose);

    let input = open_input(&args.pgn)?;
    let mut out = open_output(args.output.as_deref())?;
    let stats = extract_stream(input, &mut out).context("Extraction failed")?;

    tracing::info!(
        games = stats.games,
        skipped = stats.failed,
        positions = stats.positions,
        "done"
    );
    Ok(())
}

