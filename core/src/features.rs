// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feature table conversion through an external engine
//!
//! The engine turns an EPD file into a whitespace delimited table with a
//! header row, one row per position and a trailing label column. The
//! converter drops that column, casts to `f32` and stores the result as a
//! `.npy` array next to the table, which is then removed.

use crate::batch::{list_files, BatchReport};
use crate::config::ConvConfig;
use crate::{PrepError, Result};
use ndarray::{s, Array2};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, info, warn};

/// Extension of the intermediate table written by the engine
pub const TABLE_EXTENSION: &str = ".feats";

/// How an engine run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub success: bool,
    pub description: String,
}

impl EngineStatus {
    pub fn success() -> Self {
        Self {
            success: true,
            description: "exit status: 0".to_string(),
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            success: false,
            description: description.into(),
        }
    }
}

impl From<ExitStatus> for EngineStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            description: status.to_string(),
        }
    }
}

/// Something that writes a feature table for an EPD file
pub trait FeatureEngine {
    /// Convert `input` into a table at `output`
    fn convert(&self, input: &Path, output: &Path) -> Result<EngineStatus>;
}

/// The engine binary, run as `<program> conv_file <input> <output>`
#[derive(Debug, Clone)]
pub struct EngineCommand {
    program: PathBuf,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FeatureEngine for EngineCommand {
    fn convert(&self, input: &Path, output: &Path) -> Result<EngineStatus> {
        info!(
            "Calling {} conv_file {} {}...",
            self.program.display(),
            input.display(),
            output.display()
        );
        let status = Command::new(&self.program)
            .arg("conv_file")
            .arg(input)
            .arg(output)
            .status()?;
        Ok(status.into())
    }
}

/// A parsed feature table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    /// Column names from the header row
    pub header: Vec<String>,
    /// Row-major values, `header.len()` per row
    pub values: Array2<f64>,
}

impl FeatureTable {
    /// Parse a table: a header row, then rows with one value per header
    /// column. Blank lines are ignored.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let table_error = |line: usize, message: String| PrepError::FeatureTable {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());

        let header: Vec<String> = match lines.next() {
            Some((_, l)) => l.split_whitespace().map(str::to_string).collect(),
            None => return Err(table_error(1, "missing header row".to_string())),
        };
        let width = header.len();

        let mut values = Vec::new();
        let mut rows = 0;
        for (i, line) in lines {
            let start = values.len();
            for token in line.split_whitespace() {
                let v = token
                    .parse::<f64>()
                    .map_err(|_| table_error(i + 1, format!("not a number: {token:?}")))?;
                values.push(v);
            }
            let found = values.len() - start;
            if found != width {
                return Err(table_error(
                    i + 1,
                    format!("expected {width} columns, found {found}"),
                ));
            }
            rows += 1;
        }

        let values = Array2::from_shape_vec((rows, width), values)
            .map_err(|e| table_error(0, e.to_string()))?;
        Ok(Self { header, values })
    }

    /// Load a table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    /// Feature matrix: every column except the last, as `f32`.
    ///
    /// When `expected` is given the remaining width must match it.
    pub fn features(&self, expected: Option<usize>) -> Result<Array2<f32>> {
        let width = self.values.ncols();
        if width == 0 {
            return Err(PrepError::FeatureWidth {
                expected: expected.unwrap_or(0),
                found: 0,
            });
        }
        let found = width - 1;
        if let Some(expected) = expected {
            if expected != found {
                return Err(PrepError::FeatureWidth { expected, found });
            }
        }
        Ok(self.values.slice(s![.., ..found]).mapv(|v| v as f32))
    }
}

/// Removes the intermediate table when dropped
struct TableGuard<'a>(&'a Path);

impl Drop for TableGuard<'_> {
    fn drop(&mut self) {
        debug!("removing {}", self.0.display());
        if let Err(e) = fs::remove_file(self.0) {
            warn!(path = %self.0.display(), "could not remove feature table: {}", e);
        }
    }
}

/// Paths used when converting one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvPaths {
    pub input: PathBuf,
    pub table: PathBuf,
    pub array: PathBuf,
}

impl ConvPaths {
    pub fn new(input: &Path, config: &ConvConfig) -> Self {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            input: input.to_path_buf(),
            table: config.output_path.join(format!("{name}{TABLE_EXTENSION}")),
            array: config
                .output_path
                .join(format!("{name}{}.npy", config.output_ext)),
        }
    }
}

/// Convert one EPD file into a feature array
pub fn convert_file<E: FeatureEngine>(
    engine: &E,
    input: &Path,
    config: &ConvConfig,
) -> Result<PathBuf> {
    let paths = ConvPaths::new(input, config);

    // a leftover table must not pass for this run's output
    match fs::remove_file(&paths.table) {
        Ok(()) => warn!("removed stale {}", paths.table.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    let status = engine.convert(&paths.input, &paths.table)?;

    if !paths.table.exists() {
        return Err(PrepError::EngineNoOutput {
            path: paths.table,
            status: status.description,
        });
    }
    let _guard = TableGuard(&paths.table);

    if !status.success {
        return Err(PrepError::EngineFailed {
            status: status.description,
        });
    }

    let table = FeatureTable::load(&paths.table)?;
    let features = table.features(config.feature_width)?;
    ndarray_npy::write_npy(&paths.array, &features)?;

    info!(
        rows = features.nrows(),
        cols = features.ncols(),
        "wrote {}",
        paths.array.display()
    );
    Ok(paths.array)
}

/// Convert every file of the configured input directory whose name
/// contains the input extension
pub fn convert_directory<E: FeatureEngine>(engine: &E, config: &ConvConfig) -> Result<BatchReport> {
    fs::create_dir_all(&config.output_path)?;
    let mut report = BatchReport::default();

    for input in list_files(&config.input_path)? {
        let matches = input
            .file_name()
            .map(|n| n.to_string_lossy().contains(&config.input_ext))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        report.record(&input, convert_file(engine, &input, config));
    }

    Ok(report)
}
