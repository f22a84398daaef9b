// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use epdprep_core::batch::{extract_directory, EPD_EXTENSION};
use epdprep_tools::{finish_batch, init_logging, parse_args};
use std::path::PathBuf;
use std::process::ExitCode;

/// Convert every PGN file of a directory into an EPD file of the same name
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of PGN files
    pgndir: PathBuf,

    /// Directory receiving the EPD files
    out_dir: PathBuf,

    /// Extension of the written files
    #[arg(long, default_value = EPD_EXTENSION)]
    output_ext: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args: Args = parse_args();
    init_logging(args.verbose);

    let report = extract_directory(&args.pgndir, &args.out_dir, &args.output_ext)
        .with_context(|| format!("Failed to read {}", args.pgndir.display()))?;
    Ok(finish_batch("pgndir2epd", &report))
}
