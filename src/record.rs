//! JSON game records.
//!
//! A record keeps the starting grid, every direction played and the score
//! after each move, plus a summary block for quick inspection.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Direction, Score, Tile};

#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed record: {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub width: usize,
    pub height: usize,
    pub winning_tile: Tile,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub final_score: Score,
    pub highest_tile: Tile,
    pub moves: u64,
    pub won: bool,
    pub engine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub meta: RecordMeta,
    /// Row-major starting cells.
    pub initial_cells: Vec<Tile>,
    pub moves: Vec<Direction>,
    /// Score after each entry of `moves`.
    pub scores: Vec<Score>,
}

impl GameRecord {
    /// Start a record from the initial board.
    pub fn begin(board: &Board, engine: Option<String>) -> Self {
        Self {
            meta: RecordMeta {
                width: board.width(),
                height: board.height(),
                winning_tile: board.rules().winning_tile(),
                start_unix_s: now_unix_seconds(),
                elapsed_s: 0.0,
                final_score: board.score(),
                highest_tile: board.highest_tile(),
                moves: 0,
                won: board.has_won(),
                engine,
            },
            initial_cells: board.cells().to_vec(),
            moves: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// Append a move that has just been played on `board`.
    pub fn push(&mut self, dir: Direction, board: &Board) {
        self.moves.push(dir);
        self.scores.push(board.score());
    }

    /// Fill in the summary from the final board.
    pub fn finish(&mut self, board: &Board, elapsed_s: f32) {
        self.meta.elapsed_s = elapsed_s;
        self.meta.final_score = board.score();
        self.meta.highest_tile = board.highest_tile();
        self.meta.moves = self.moves.len() as u64;
        self.meta.won = board.has_won();
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), RecordError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self, RecordError> {
        let record: GameRecord = serde_json::from_reader(reader)?;
        record.check()?;
        Ok(record)
    }

    pub fn write_file(&self, path: &Path) -> Result<(), RecordError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn read_file(path: &Path) -> Result<Self, RecordError> { Self::read_from(BufReader::new(File::open(path)?)) }

    fn check(&self) -> Result<(), RecordError> {
        if self.initial_cells.len() != self.meta.width * self.meta.height {
            return Err(RecordError::Malformed("initial cell count does not match dimensions"));
        }
        if self.scores.len() != self.moves.len() {
            return Err(RecordError::Malformed("scores and moves differ in length"));
        }
        if self.meta.moves != self.moves.len() as u64 {
            return Err(RecordError::Malformed("move count does not match moves"));
        }
        if self.scores.windows(2).any(|w| w[1] < w[0]) {
            return Err(RecordError::Malformed("score decreased"));
        }
        Ok(())
    }
}

pub fn now_unix_seconds() -> u64 { SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0) }
