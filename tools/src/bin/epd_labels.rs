// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use epdprep_core::labels::{label_directories, label_pair};
use epdprep_tools::{finish_batch, init_logging, parse_args};
use std::path::PathBuf;
use std::process::ExitCode;

/// Label every EPD line with the game result from its side to move's view
/// (1 win, -1 loss, 0 draw or unknown)
///
/// With two directories, files are paired in name order. With two files,
/// the single pair is labelled.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PGN file or directory the EPD lines were extracted from
    pgn: PathBuf,

    /// EPD file or directory
    epd: PathBuf,

    /// Directory receiving the `<epd name>.xie` label files
    out_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args: Args = parse_args();
    init_logging(args.verbose);

    if args.pgn.is_dir() {
        let report = label_directories(&args.pgn, &args.epd, &args.out_dir)
            .context("Failed to list input directories")?;
        return Ok(finish_batch("epd-labels", &report));
    }

    label_pair(&args.pgn, &args.epd, &args.out_dir).with_context(|| {
        format!(
            "Failed to label {} against {}",
            args.epd.display(),
            args.pgn.display()
        )
    })?;
    Ok(ExitCode::SUCCESS)
}
