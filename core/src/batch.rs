// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory batch processing
//!
//! Every batch tool walks a directory and handles each file on its own: a
//! failure is logged and recorded in a [`BatchReport`], and the remaining
//! files are still processed.

use crate::epd::{extract_stream, ExtractStats};
use crate::{PrepError, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Extension given to EPD files written by the directory extractor
pub const EPD_EXTENSION: &str = "epd";

/// Outcome of a directory run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files handled successfully
    pub succeeded: Vec<PathBuf>,
    /// Files that failed, with the reason
    pub failed: Vec<(PathBuf, PrepError)>,
}

impl BatchReport {
    /// Record the outcome for one input file
    pub fn record<T>(&mut self, path: &Path, result: Result<T>) {
        match result {
            Ok(_) => self.succeeded.push(path.to_path_buf()),
            Err(e) => {
                error!(path = %path.display(), "failed: {}", e);
                self.failed.push((path.to_path_buf(), e));
            }
        }
    }

    /// True when every file was processed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of files attempted
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Regular files of a directory, sorted by name
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for `input` in `out_dir`: same base name, new extension
pub fn output_path(input: &Path, out_dir: &Path, extension: &str) -> PathBuf {
    let name = input.file_name().map(Path::new).unwrap_or(input);
    out_dir.join(name.with_extension(extension))
}

/// Extract one PGN file into one EPD file
pub fn extract_file(input: &Path, output: &Path) -> Result<ExtractStats> {
    let pgn = File::open(input)?;
    let mut out = BufWriter::new(File::create(output)?);
    extract_stream(pgn, &mut out)
}

/// Extract every file of `pgn_dir` into `out_dir`, one EPD file per input
pub fn extract_directory(pgn_dir: &Path, out_dir: &Path, extension: &str) -> Result<BatchReport> {
    fs::create_dir_all(out_dir)?;
    let mut report = BatchReport::default();

    for (i, input) in list_files(pgn_dir)?.iter().enumerate() {
        let output = output_path(input, out_dir, extension);
        let result = extract_file(input, &output);
        if let Ok(stats) = &result {
            info!(
                games = stats.games,
                failed = stats.failed,
                positions = stats.positions,
                "[{}] {} -> {}",
                i + 1,
                input.display(),
                output.display()
            );
        }
        report.record(input, result);
    }

    Ok(report)
}
