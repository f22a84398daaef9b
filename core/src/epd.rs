// SPDX-License-Identifier: MIT OR Apache-2.0

//! EPD position extraction

use crate::pgn::{GameRecord, PgnGames};
use crate::{PrepError, Result};
use shakmaty::fen::Epd;
use shakmaty::san::San;
use shakmaty::{Chess, EnPassantMode, Move, Position};
use std::fmt;
use std::io::{Read, Write};

/// One extracted position, optionally annotated with the move played from it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionRecord {
    /// Four-field EPD of the position
    pub epd: String,
    /// SAN of the move played, rendered as an `sm` operation
    pub played: Option<String>,
}

impl PositionRecord {
    /// Bare position without a move annotation
    pub fn new(pos: &Chess) -> Self {
        Self {
            epd: epd_string(pos),
            played: None,
        }
    }

    /// Position annotated with the move played from it
    pub fn with_move(pos: &Chess, mv: &Move) -> Self {
        Self {
            epd: epd_string(pos),
            played: Some(san_string(pos, mv)),
        }
    }
}

impl fmt::Display for PositionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.played {
            Some(san) => write!(f, "{} sm {};", self.epd, san),
            None => f.write_str(&self.epd),
        }
    }
}

/// Render a position as four-field EPD.
///
/// The en passant square only appears when a legal capture exists.
pub fn epd_string(pos: &Chess) -> String {
    Epd::from_setup(pos.clone().into_setup(EnPassantMode::Legal)).to_string()
}

/// SAN of `mv` in `pos`, with the check or mate suffix
pub fn san_string(pos: &Chess, mv: &Move) -> String {
    let san = San::from_move(pos, mv);
    let mut after = pos.clone();
    after.play_unchecked(mv);
    if after.is_checkmate() {
        format!("{san}#")
    } else if after.is_check() {
        format!("{san}+")
    } else {
        san.to_string()
    }
}

/// Side-to-move token of an EPD line (the second whitespace separated field)
pub fn side_to_move(line: &str, line_no: usize) -> Result<&str> {
    line.split_whitespace().nth(1).ok_or_else(|| PrepError::Epd {
        line: line_no,
        message: "missing side-to-move field".to_string(),
    })
}

/// Every position on the main line of a game, annotated with the move played.
///
/// The final position has no following move and is not emitted.
pub fn game_positions(game: &GameRecord) -> Result<Vec<PositionRecord>> {
    let mut records = Vec::with_capacity(game.plies());
    game.walk(None, |pos, mv| records.push(PositionRecord::with_move(pos, mv)))?;
    Ok(records)
}

/// Counters for one extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Games read from the stream
    pub games: usize,
    /// Games skipped because they could not be replayed
    pub failed: usize,
    /// Lines written
    pub positions: usize,
}

/// Extract every game of a PGN stream as EPD lines.
///
/// A game that cannot be replayed is logged and contributes no lines; I/O
/// errors abort the run.
pub fn extract_stream<R: Read, W: Write>(input: R, out: &mut W) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();

    for game in PgnGames::new(input) {
        let game = game?;
        stats.games += 1;
        match game_positions(&game) {
            Ok(records) => {
                for record in &records {
                    writeln!(out, "{record}")?;
                }
                stats.positions += records.len();
            }
            Err(e) => {
                tracing::warn!(game = game.index, "skipping game: {}", e);
                stats.failed += 1;
            }
        }
    }

    out.flush()?;
    Ok(stats)
}
