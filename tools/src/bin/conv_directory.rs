// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use epdprep_core::config::ConvConfig;
use epdprep_core::features::{convert_directory, EngineCommand};
use epdprep_tools::{finish_batch, init_logging, parse_args};
use std::path::PathBuf;
use std::process::ExitCode;

/// Run the engine's feature conversion over a directory of EPD files and
/// store each feature matrix as a float32 .npy array
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with defaults for the options below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only convert files whose name contains this [default: .epd]
    #[arg(long)]
    input_ext: Option<String>,

    /// Appended to the input file name for the array file [default: .xie]
    #[arg(long)]
    output_ext: Option<String>,

    /// Directory of EPD files [default: tests/testsuites]
    #[arg(long)]
    input_path: Option<PathBuf>,

    /// Output directory [default: tests/feat_ext_files]
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Engine executable [default: ./giraffe]
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Number of feature columns the engine must produce
    #[arg(long)]
    feature_width: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Config file values, overridden by explicit flags
    fn resolve(self) -> Result<ConvConfig> {
        let mut config = match &self.config {
            Some(path) => ConvConfig::load(path)?,
            None => ConvConfig::default(),
        };
        if let Some(v) = self.input_ext {
            config.input_ext = v;
        }
        if let Some(v) = self.output_ext {
            config.output_ext = v;
        }
        if let Some(v) = self.input_path {
            config.input_path = v;
        }
        if let Some(v) = self.output_path {
            config.output_path = v;
        }
        if let Some(v) = self.engine {
            config.engine = v;
        }
        if self.feature_width.is_some() {
            config.feature_width = self.feature_width;
        }
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let args: Args = parse_args();
    init_logging(args.verbose);

    let config = args.resolve()?;
    tracing::debug!(?config, "resolved configuration");

    let engine = EngineCommand::new(&config.engine);
    let report = convert_directory(&engine, &config)
        .with_context(|| format!("Failed to read {}", config.input_path.display()))?;
    Ok(finish_batch("conv-directory", &report))
}
