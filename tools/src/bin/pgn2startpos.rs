// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use epdprep_core::sampler::StartPositionSampler;
use epdprep_tools::{init_logging, open_input, open_output, parse_args};

/// Print the position reached after a number of plies in each game, once
/// per distinct position
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PGN file, or - for standard input
    pgn: String,

    /// Plies to play along the main line before sampling
    skip: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Args = parse_args();
    init_logging(args.verbose);

    let input = open_input(&args.pgn)?;
    let mut out = open_output(None)?;
    let mut sampler = StartPositionSampler::new(args.skip);
    let written = sampler.run(input, &mut out).context("Sampling failed")?;

    tracing::info!(skip = args.skip, positions = written, "done");
    Ok(())
}
