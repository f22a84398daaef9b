// SPDX-License-Identifier: MIT OR Apache-2.0

//! Start position sampling

use crate::epd::PositionRecord;
use crate::pgn::{GameRecord, PgnGames};
use crate::Result;
use std::collections::HashSet;
use std::io::{Read, Write};
use tracing::warn;

/// Samples one position per game after a fixed number of plies, emitting
/// each distinct position once per run.
#[derive(Debug, Default)]
pub struct StartPositionSampler {
    skip: usize,
    seen: HashSet<String>,
}

impl StartPositionSampler {
    /// Sampler that advances `skip` plies along each main line
    pub fn new(skip: usize) -> Self {
        Self {
            skip,
            seen: HashSet::new(),
        }
    }

    /// Candidate position of a game, if it has moves left after `skip` plies
    pub fn candidate(&self, game: &GameRecord) -> Result<Option<String>> {
        if game.plies() <= self.skip {
            return Ok(None);
        }
        let pos = game.walk(Some(self.skip), |_, _| {})?;
        Ok(Some(PositionRecord::new(&pos).epd))
    }

    /// The game's candidate, unless an earlier game already produced it
    pub fn sample(&mut self, game: &GameRecord) -> Result<Option<String>> {
        Ok(self.candidate(game)?.filter(|epd| self.seen.insert(epd.clone())))
    }

    /// Number of distinct positions emitted so far
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }

    /// Sample every game of a PGN stream, writing new positions to `out`.
    ///
    /// Returns the number of lines written.
    pub fn run<R: Read, W: Write>(&mut self, input: R, out: &mut W) -> Result<usize> {
        let mut written = 0;
        for game in PgnGames::new(input) {
            let game = game?;
            match self.sample(&game) {
                Ok(Some(epd)) => {
                    writeln!(out, "{epd}")?;
                    written += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(game = game.index, "skipping game: {}", e),
            }
        }
        out.flush()?;
        Ok(written)
    }
}
