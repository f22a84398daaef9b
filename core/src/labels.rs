// SPDX-License-Identifier: MIT OR Apache-2.0

//! Win/loss/draw labelling of extracted positions
//!
//! An EPD file produced by the extractor lists the positions of every game
//! of its PGN file in order. The labeller replays the PGN file to find the
//! first EPD line of each game, then labels each line from the point of view
//! of its side to move: `1` if that side went on to win, `-1` if it lost and
//! `0` for draws or unknown results.

use crate::batch::{list_files, BatchReport};
use crate::epd::side_to_move;
use crate::pgn::PgnGames;
use crate::Result;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix appended to the EPD file name to name its label file
pub const LABEL_SUFFIX: &str = ".xie";

/// Winner declared by a game's `Result` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winner {
    White,
    Black,
    /// Draw, unfinished or unknown
    None,
}

impl Winner {
    /// Interpret a PGN result string
    pub fn from_result(result: &str) -> Self {
        match result.trim() {
            "1-0" => Winner::White,
            "0-1" => Winner::Black,
            _ => Winner::None,
        }
    }

    /// EPD side-to-move token of the winning side
    pub fn side_token(&self) -> Option<&'static str> {
        match self {
            Winner::White => Some("w"),
            Winner::Black => Some("b"),
            Winner::None => None,
        }
    }

    /// Label of a position whose side to move is `side`
    pub fn label_for(&self, side: &str) -> i8 {
        match self.side_token() {
            Some(token) if token == side => 1,
            Some(_) => -1,
            None => 0,
        }
    }
}

/// Where a game's positions start in the paired EPD file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOffset {
    /// Index of the game's first EPD line
    pub line: usize,
    pub winner: Winner,
}

/// Scan a PGN stream for the starting EPD line and winner of every game.
///
/// Offsets follow the extractor exactly: each game advances the line count
/// by its main-line ply count, and games that fail to replay produce no
/// lines and no offset.
pub fn scan_offsets<R: Read>(pgn: R) -> Result<Vec<GameOffset>> {
    let mut offsets = Vec::new();
    let mut line = 0;

    for game in PgnGames::new(pgn) {
        let game = game?;
        let mut plies = 0;
        match game.walk(None, |_, _| plies += 1) {
            Ok(_) => {
                offsets.push(GameOffset {
                    line,
                    winner: game.winner(),
                });
                line += plies;
            }
            Err(e) => warn!(game = game.index, "game has no positions: {}", e),
        }
    }

    debug!(games = offsets.len(), lines = line, "scanned game offsets");
    Ok(offsets)
}

/// Label every line of an EPD stream.
///
/// The last game has no following offset, so every line from its offset to
/// the end of the stream carries its result.
pub fn label_lines<R: BufRead>(offsets: &[GameOffset], epd: R) -> Result<Vec<i8>> {
    if offsets.is_empty() {
        warn!("no games to correlate with, labelling every position as 0");
    }

    let mut labels = Vec::new();
    let mut game = 0;

    for (j, line) in epd.lines().enumerate() {
        let line = line?;
        while game + 1 < offsets.len() && j >= offsets[game + 1].line {
            game += 1;
        }
        let winner = offsets.get(game).map_or(Winner::None, |o| o.winner);
        labels.push(winner.label_for(side_to_move(&line, j + 1)?));
    }

    Ok(labels)
}

/// Write one label per line
pub fn write_labels<W: Write>(out: &mut W, labels: &[i8]) -> Result<()> {
    for label in labels {
        writeln!(out, "{label}")?;
    }
    out.flush()?;
    Ok(())
}

/// Path of the label file for `epd_path` inside `out_dir`
pub fn label_path(epd_path: &Path, out_dir: &Path) -> PathBuf {
    let name = epd_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("{name}{LABEL_SUFFIX}"))
}

/// Label one EPD file against the PGN file it was extracted from
pub fn label_pair(pgn_path: &Path, epd_path: &Path, out_dir: &Path) -> Result<PathBuf> {
    let offsets = scan_offsets(File::open(pgn_path)?)?;
    let labels = label_lines(&offsets, BufReader::new(File::open(epd_path)?))?;

    fs::create_dir_all(out_dir)?;
    let out_path = label_path(epd_path, out_dir);
    let mut out = BufWriter::new(File::create(&out_path)?);
    write_labels(&mut out, &labels)?;

    info!(
        pgn = %pgn_path.display(),
        epd = %epd_path.display(),
        games = offsets.len(),
        positions = labels.len(),
        "wrote {}",
        out_path.display()
    );
    Ok(out_path)
}

/// Label every EPD file of `epd_dir` against the PGN file of `pgn_dir` at
/// the same position in name order.
pub fn label_directories(pgn_dir: &Path, epd_dir: &Path, out_dir: &Path) -> Result<BatchReport> {
    let pgn_files = list_files(pgn_dir)?;
    let epd_files = list_files(epd_dir)?;
    if pgn_files.len() != epd_files.len() {
        warn!(
            pgn = pgn_files.len(),
            epd = epd_files.len(),
            "directory sizes differ, unpaired files are ignored"
        );
    }

    let mut report = BatchReport::default();
    for (i, (pgn, epd)) in pgn_files.iter().zip(&epd_files).enumerate() {
        info!("[{}] {} / {}", i + 1, pgn.display(), epd.display());
        report.record(epd, label_pair(pgn, epd, out_dir));
    }
    Ok(report)
}
