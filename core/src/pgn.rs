// SPDX-License-Identifier: MIT OR Apache-2.0

//! PGN reading along each game's main line

use crate::labels::Winner;
use crate::{PrepError, Result};
use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Move, Position};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One game as recorded in a PGN stream, reduced to what the tools consume
#[derive(Debug, Clone)]
pub struct GameRecord {
    /// 1-based position of the game in its stream
    pub index: usize,
    /// Value of the `Result` header, if present
    pub result: Option<String>,
    /// Value of the `FEN` header, if the game starts from a custom position
    pub fen: Option<String>,
    /// Moves of the main line, side variations removed
    pub moves: Vec<SanPlus>,
}

impl GameRecord {
    /// Number of plies on the main line
    pub fn plies(&self) -> usize {
        self.moves.len()
    }

    /// Winner declared by the `Result` header
    pub fn winner(&self) -> Winner {
        self.result
            .as_deref()
            .map(Winner::from_result)
            .unwrap_or(Winner::None)
    }

    /// Position the game starts from
    pub fn start_position(&self) -> Result<Chess> {
        match &self.fen {
            None => Ok(Chess::default()),
            Some(fen) => {
                let setup = Fen::from_ascii(fen.as_bytes())
                    .map_err(|e| self.error(format!("invalid FEN header {fen:?}: {e}")))?;
                setup
                    .into_position(CastlingMode::Standard)
                    .map_err(|e| self.error(format!("illegal FEN position {fen:?}: {e}")))
            }
        }
    }

    /// Replay the main line, calling `visit` with the position before each
    /// move and the move played from it.
    ///
    /// Stops after `max_plies` moves when a limit is given. Returns the
    /// position reached.
    pub fn walk<F>(&self, max_plies: Option<usize>, mut visit: F) -> Result<Chess>
    where
        F: FnMut(&Chess, &Move),
    {
        let mut pos = self.start_position()?;
        let limit = max_plies.unwrap_or(usize::MAX);

        for (ply, san_plus) in self.moves.iter().take(limit).enumerate() {
            let mv = san_plus.san.to_move(&pos).map_err(|e| {
                self.error(format!("ply {}: illegal move {}: {}", ply + 1, san_plus, e))
            })?;
            visit(&pos, &mv);
            pos.play_unchecked(&mv);
        }

        Ok(pos)
    }

    fn error(&self, message: String) -> PrepError {
        PrepError::Pgn {
            game: self.index,
            message,
        }
    }
}

/// Visitor that keeps the headers we need and the main line only
#[derive(Default)]
struct MainLineVisitor {
    games: usize,
    result: Option<String>,
    fen: Option<String>,
    moves: Vec<SanPlus>,
}

impl Visitor for MainLineVisitor {
    type Result = GameRecord;

    fn begin_game(&mut self) {
        self.games += 1;
        self.result = None;
        self.fen = None;
        self.moves.clear();
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        match key {
            b"Result" => self.result = Some(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            b"FEN" => self.fen = Some(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            _ => {}
        }
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn san(&mut self, san_plus: SanPlus) {
        self.moves.push(san_plus);
    }

    fn end_game(&mut self) -> Self::Result {
        GameRecord {
            index: self.games,
            result: self.result.take(),
            fen: self.fen.take(),
            moves: std::mem::take(&mut self.moves),
        }
    }
}

/// Iterator over the games of a PGN stream
///
/// Yields one item per game. An I/O error ends the iteration after being
/// reported once.
pub struct PgnGames<R: Read> {
    reader: BufferedReader<R>,
    visitor: MainLineVisitor,
    done: bool,
}

impl<R: Read> PgnGames<R> {
    /// Read games from any byte stream
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufferedReader::new(inner),
            visitor: MainLineVisitor::default(),
            done: false,
        }
    }
}

impl PgnGames<File> {
    /// Open a PGN file
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> Iterator for PgnGames<R> {
    type Item = Result<GameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_game(&mut self.visitor) {
            Ok(Some(game)) => Some(Ok(game)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
