// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared setup for the epdprep command-line tools

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use epdprep_core::BatchReport;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Path argument that stands for standard input
pub const STDIN_PATH: &str = "-";

/// Parse arguments, exiting with status 1 and a usage message on bad input.
///
/// `--help` and `--version` exit with status 0.
pub fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    }
}

/// Log to stderr; stdout is left for data.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`; `verbose` forces
/// `debug`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Open a PGN source, `-` meaning standard input
pub fn open_input(path: &str) -> Result<Box<dyn Read>> {
    if path == STDIN_PATH {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Open a destination, standard output when no path is given
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Log the summary of a directory run and turn it into an exit code
pub fn finish_batch(what: &str, report: &BatchReport) -> ExitCode {
    if report.is_success() {
        tracing::info!("{}: {} files done", what, report.total());
        return ExitCode::SUCCESS;
    }
    tracing::error!(
        "{}: {} of {} files failed",
        what,
        report.failed.len(),
        report.total()
    );
    for (path, e) in &report.failed {
        tracing::error!("  {}: {}", path.display(), e);
    }
    ExitCode::from(1)
}
