//! Board state and the slide/merge engine.
//!
//! A [`Board`] is a `width x height` grid of tile values (0 = empty) plus the
//! running score, a move counter and a sticky "has won" flag. Moves compact
//! every row or column toward the move direction, merging equal neighbours
//! at most once per resulting tile, then spawn a new tile from the board's
//! [`SpawnTable`].
//!
//! ```
//! use tile_merge::engine::{Board, Direction};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut board = Board::new(4, 4, &mut rng).unwrap();
//! assert_eq!(board.empty_cells().len(), 14);
//!
//! let moved = Direction::ALL.iter().any(|&dir| board.make_move(dir, &mut rng));
//! assert!(moved);
//! assert_eq!(board.move_count(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod spawn;

pub use spawn::{SpawnTable, SpawnTableError};

/// A tile value. 0 is an empty cell, everything else is a power of two.
pub type Tile = u32;
/// Cumulative game score.
pub type Score = u64;

/// Tile that flips the board into the "won" state unless configured otherwise.
pub const DEFAULT_WINNING_TILE: Tile = 2048;

/// Largest representable tile. Two of these never merge.
pub const MAX_TILE: Tile = 1 << 31;

/// A cell position. `x` is the column, `y` the row (row 0 is the top edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Coordinate) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// The neighbouring coordinate one step toward `dir`. May be off the board.
    #[inline]
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// A direction to slide tiles.
///
/// "No direction" is spelled `Option::<Direction>::None` wherever it can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed iteration order; also the tie-break order of the search.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Position of this direction inside [`Direction::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    #[inline]
    const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: usize, height: usize },
    #[error("a {width}x{height} board cannot hold the two starting tiles")]
    TooSmall { width: usize, height: usize },
    #[error("a {width}x{height} board is too large")]
    TooLarge { width: usize, height: usize },
    #[error("expected {expected} cells, got {actual}")]
    CellCount { expected: usize, actual: usize },
    #[error("cell value {0} is neither empty nor a power of two")]
    InvalidTile(Tile),
    #[error("winning tile {0} is not a power of two of at least 2")]
    InvalidWinningTile(Tile),
}

/// Immutable game rules shared by a board and every copy made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    spawn: SpawnTable,
    winning_tile: Tile,
}

impl Rules {
    pub fn new(spawn: SpawnTable, winning_tile: Tile) -> Result<Self, BoardError> {
        if winning_tile < 2 || !winning_tile.is_power_of_two() {
            return Err(BoardError::InvalidWinningTile(winning_tile));
        }
        Ok(Self { spawn, winning_tile })
    }

    #[inline]
    pub fn spawn(&self) -> &SpawnTable { &self.spawn }

    #[inline]
    pub fn winning_tile(&self) -> Tile { self.winning_tile }
}

impl Default for Rules {
    fn default() -> Self {
        Self { spawn: SpawnTable::default(), winning_tile: DEFAULT_WINNING_TILE }
    }
}

/// The cells of one row or column, ordered from the edge tiles move toward.
#[derive(Clone, Copy)]
struct Lines {
    dir: Direction,
    width: usize,
    height: usize,
}

impl Lines {
    fn new(dir: Direction, width: usize, height: usize) -> Self { Self { dir, width, height } }

    fn count(&self) -> usize {
        match self.dir {
            Direction::Up | Direction::Down => self.width,
            Direction::Left | Direction::Right => self.height,
        }
    }

    fn len(&self) -> usize {
        match self.dir {
            Direction::Up | Direction::Down => self.height,
            Direction::Left | Direction::Right => self.width,
        }
    }

    /// Row-major cell index of position `pos` on line `line`.
    fn cell(&self, line: usize, pos: usize) -> usize {
        let (x, y) = match self.dir {
            Direction::Up => (line, pos),
            Direction::Down => (line, self.height - 1 - pos),
            Direction::Left => (pos, line),
            Direction::Right => (self.width - 1 - pos, line),
        };
        y * self.width + x
    }
}

/// Compact `line` toward index 0 in place and return the points scored.
///
/// Each tile slides over empty cells until it hits a tile or the write
/// floor. Equal tiles merge into one of double value; the merged cell is
/// then locked so it cannot absorb a third tile in the same pass.
/// Tiles at [`MAX_TILE`] have no successor and stay unmerged.
///
/// ```
/// use tile_merge::engine::compact_line;
/// let mut line = [2, 2, 2, 2];
/// assert_eq!(compact_line(&mut line), 8);
/// assert_eq!(line, [4, 4, 0, 0]);
/// ```
pub fn compact_line(line: &mut [Tile]) -> Score {
    let mut gained: Score = 0;
    let mut floor = 0;
    for src in 1..line.len() {
        let tile = line[src];
        if tile == 0 {
            continue;
        }
        line[src] = 0;
        let mut dst = src;
        while dst > floor && line[dst - 1] == 0 {
            dst -= 1;
        }
        let merged = (dst > floor && line[dst - 1] == tile).then(|| tile.checked_mul(2)).flatten();
        if let Some(merged) = merged {
            line[dst - 1] = merged;
            gained += Score::from(merged);
            floor = dst;
        } else {
            line[dst] = tile;
        }
    }
    gained
}

/// A game board. Cloning yields a fully independent copy; only the
/// immutable [`Rules`] are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Tile>,
    score: Score,
    moves: u64,
    empty: Vec<Coordinate>,
    has_won: bool,
    last_spawn: Option<Coordinate>,
    rules: Arc<Rules>,
}

impl Board {
    /// A fresh board with the default rules and two spawned tiles.
    pub fn new<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Result<Self, BoardError> {
        Self::with_rules(width, height, Arc::new(Rules::default()), rng)
    }

    /// A fresh board with the given rules and two spawned tiles.
    pub fn with_rules<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        rules: Arc<Rules>,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        let mut board = Self::empty(width, height, rules)?;
        board.spawn_tile(rng);
        board.spawn_tile(rng);
        board.last_spawn = None;
        Ok(board)
    }

    /// Build a board from row-major cell values, e.g. for fixtures or replays.
    ///
    /// Score and move counter start at zero; `has_won` reflects the cells.
    pub fn from_cells(width: usize, height: usize, cells: Vec<Tile>, rules: Arc<Rules>) -> Result<Self, BoardError> {
        let mut board = Self::empty(width, height, rules)?;
        if cells.len() != board.cells.len() {
            return Err(BoardError::CellCount { expected: board.cells.len(), actual: cells.len() });
        }
        if let Some(&bad) = cells.iter().find(|&&v| v != 0 && !v.is_power_of_two()) {
            return Err(BoardError::InvalidTile(bad));
        }
        board.cells = cells;
        board.has_won = board.contains_tile(board.rules.winning_tile);
        board.recompute_empty_cells();
        Ok(board)
    }

    /// Validate board dimensions, returning the number of cells.
    pub fn check_dimensions(width: usize, height: usize) -> Result<usize, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::ZeroDimension { width, height });
        }
        let size = match width.checked_mul(height) {
            Some(n) if width <= i32::MAX as usize && height <= i32::MAX as usize => n,
            _ => return Err(BoardError::TooLarge { width, height }),
        };
        if size < 2 {
            return Err(BoardError::TooSmall { width, height });
        }
        Ok(size)
    }

    fn empty(width: usize, height: usize, rules: Arc<Rules>) -> Result<Self, BoardError> {
        let size = Self::check_dimensions(width, height)?;
        let mut board = Self {
            width,
            height,
            cells: vec![0; size],
            score: 0,
            moves: 0,
            empty: Vec::with_capacity(size),
            has_won: false,
            last_spawn: None,
            rules,
        };
        board.recompute_empty_cells();
        Ok(board)
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }

    #[inline]
    pub fn height(&self) -> usize { self.height }

    /// Row-major view of all cells.
    #[inline]
    pub fn cells(&self) -> &[Tile] { &self.cells }

    #[inline]
    pub fn score(&self) -> Score { self.score }

    #[inline]
    pub fn move_count(&self) -> u64 { self.moves }

    /// True once the winning tile has appeared; never reset.
    #[inline]
    pub fn has_won(&self) -> bool { self.has_won }

    #[inline]
    pub fn rules(&self) -> &Arc<Rules> { &self.rules }

    /// Where the most recent post-move tile was placed.
    #[inline]
    pub fn last_spawn(&self) -> Option<Coordinate> { self.last_spawn }

    /// Empty cells, in column-major scan order.
    #[inline]
    pub fn empty_cells(&self) -> &[Coordinate] { &self.empty }

    #[inline]
    pub fn in_bounds(&self, coord: Coordinate) -> bool {
        coord.x >= 0 && (coord.x as usize) < self.width && coord.y >= 0 && (coord.y as usize) < self.height
    }

    #[inline]
    fn index(&self, coord: Coordinate) -> Option<usize> {
        self.in_bounds(coord).then(|| coord.y as usize * self.width + coord.x as usize)
    }

    /// Tile at `coord`, or `None` when `coord` is off the board.
    #[inline]
    pub fn cell_value(&self, coord: Coordinate) -> Option<Tile> {
        self.index(coord).map(|idx| self.cells[idx])
    }

    /// All coordinates in column-major order (x outer, y inner).
    pub fn coords(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.width as i32).flat_map(move |x| (0..self.height as i32).map(move |y| Coordinate::new(x, y)))
    }

    /// Rebuild the empty-cell cache from a full scan.
    pub fn recompute_empty_cells(&mut self) {
        let mut empty = std::mem::take(&mut self.empty);
        empty.clear();
        empty.extend(self.coords().filter(|&c| self.cell_value(c) == Some(0)));
        self.empty = empty;
    }

    /// Whether any cell holds `tile`.
    pub fn contains_tile(&self, tile: Tile) -> bool { self.cells.iter().any(|&v| v == tile) }

    pub fn highest_tile(&self) -> Tile { self.cells.iter().copied().max().unwrap_or(0) }

    /// Coordinate of the first highest tile in column-major scan order.
    pub fn coord_of_highest_tile(&self) -> Coordinate {
        let mut best = Coordinate::new(0, 0);
        let mut best_val = self.cells[0];
        for coord in self.coords() {
            let val = self.cell_value(coord).unwrap_or(0);
            if val > best_val {
                best_val = val;
                best = coord;
            }
        }
        best
    }

    /// Place a random tile on a random empty cell.
    ///
    /// # Panics
    /// If the board is full. A spawn only ever follows a legal move, which
    /// always leaves at least one empty cell.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Coordinate {
        let coord = spawn::pick_cell(&self.empty, rng);
        let value = self.rules.spawn.pick_value(rng);
        if let Some(idx) = self.index(coord) {
            self.cells[idx] = value;
        }
        self.recompute_empty_cells();
        self.last_spawn = Some(coord);
        coord
    }

    /// Whether the tile at `coord` could slide or merge one step toward `dir`.
    pub fn can_move(&self, coord: Coordinate, dir: Direction) -> bool {
        let Some(tile) = self.cell_value(coord) else { return false };
        match self.cell_value(coord.step(dir)) {
            Some(next) => next == 0 || (next == tile && tile < MAX_TILE),
            None => false,
        }
    }

    /// Whether moving toward `dir` would change the board.
    pub fn is_movement_possible(&self, dir: Direction) -> bool {
        self.coords().any(|c| self.cell_value(c).is_some_and(|v| v != 0) && self.can_move(c, dir))
    }

    /// True if no direction is legal.
    pub fn is_game_over(&self) -> bool { Direction::ALL.iter().all(|&dir| !self.is_movement_possible(dir)) }

    /// Slide and merge toward `dir`, then spawn a tile.
    ///
    /// Returns `false` and leaves the board untouched when the move is
    /// illegal. A legal move adds the merge points to the score, updates the
    /// win flag, spawns one tile and bumps the move counter.
    pub fn make_move<R: Rng + ?Sized>(&mut self, dir: Direction, rng: &mut R) -> bool {
        if !self.is_movement_possible(dir) {
            return false;
        }
        self.score += self.slide(dir);
        if !self.has_won {
            self.has_won = self.contains_tile(self.rules.winning_tile);
        }
        self.recompute_empty_cells();
        self.spawn_tile(rng);
        self.moves += 1;
        true
    }

    /// Compact every line toward `dir` without spawning. Returns points scored.
    fn slide(&mut self, dir: Direction) -> Score {
        let lines = Lines::new(dir, self.width, self.height);
        let mut buf = vec![0; lines.len()];
        let mut gained = 0;
        for line in 0..lines.count() {
            for (pos, slot) in buf.iter_mut().enumerate() {
                *slot = self.cells[lines.cell(line, pos)];
            }
            gained += compact_line(&mut buf);
            for (pos, &val) in buf.iter().enumerate() {
                self.cells[lines.cell(line, pos)] = val;
            }
        }
        gained
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell_width = self.highest_tile().max(1000).to_string().len() + 2;
        let rule = "-".repeat(self.width * (cell_width + 1) - 1);
        writeln!(f)?;
        for (y, row) in self.cells.chunks(self.width).enumerate() {
            if y > 0 {
                writeln!(f, "{rule}")?;
            }
            let line: Vec<String> = row
                .iter()
                .map(|&v| if v == 0 { " ".repeat(cell_width) } else { format!("{v:^cell_width$}") })
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}
