// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use epdprep_core::topology::reinit_file;
use epdprep_tools::{init_logging, parse_args};
use std::path::PathBuf;

/// Write a copy of a network file with freshly drawn weights and biases,
/// keeping its structure and weight masks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network to take the structure from
    #[arg(short, long, default_value = "eval.net")]
    input: PathBuf,

    /// Where to write the re-initialised network
    #[arg(short, long, default_value = "random_init.net")]
    output: PathBuf,

    /// Seed for a reproducible draw
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Args = parse_args();
    init_logging(args.verbose);

    reinit_file(&args.input, &args.output, args.seed).with_context(|| {
        format!(
            "Failed to re-initialise {} into {}",
            args.input.display(),
            args.output.display()
        )
    })?;
    Ok(())
}
