// SPDX-License-Identifier: MIT OR Apache-2.0

//! epdprep core - training data preparation for chess engines
//!
//! This crate provides the conversions that turn recorded games into the
//! numeric files an engine training run consumes:
//! - PGN reading along each game's main line
//! - EPD position extraction, optionally annotated with the played move
//! - start position sampling with de-duplication
//! - win/loss/draw labelling of extracted positions
//! - feature table conversion through an external engine
//! - random re-initialisation of a network topology file

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod batch;
pub mod config;
pub mod epd;
pub mod features;
pub mod labels;
pub mod pgn;
pub mod sampler;
pub mod topology;

use std::path::PathBuf;
use thiserror::Error;

pub use batch::BatchReport;
pub use epd::PositionRecord;
pub use labels::Winner;
pub use pgn::{GameRecord, PgnGames};

/// Errors produced while preparing training data
#[derive(Debug, Error)]
pub enum PrepError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single game in a PGN stream could not be replayed
    #[error("game {game}: {message}")]
    Pgn {
        /// 1-based index of the game in its stream
        game: usize,
        /// What went wrong
        message: String,
    },

    /// An EPD line is missing a field we need
    #[error("EPD line {line}: {message}")]
    Epd { line: usize, message: String },

    /// The network topology file is malformed
    #[error("topology line {line}: {message}")]
    Topology { line: usize, message: String },

    /// The feature table written by the engine could not be parsed
    #[error("feature table {}: line {line}: {message}", path.display())]
    FeatureTable {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The feature table has a different width than configured
    #[error("feature width mismatch: expected {expected} features, table has {found}")]
    FeatureWidth { expected: usize, found: usize },

    /// The engine exited unsuccessfully
    #[error("engine {status}")]
    EngineFailed { status: String },

    /// The engine finished but never wrote its output file
    #[error("engine produced no feature table at {} ({status})", path.display())]
    EngineNoOutput { path: PathBuf, status: String },

    /// A configuration file could not be loaded
    #[error("config error: {0}")]
    Config(String),

    /// Writing the binary array failed
    #[error("npy write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, PrepError>;
