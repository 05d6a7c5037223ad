//! Game and search settings, loadable from TOML.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults (4x4 board, 2048 to win, 2/4 spawned at 90/10).
//!
//! ```
//! use tile_merge::config::Settings;
//!
//! let settings = Settings::from_toml_str(r#"
//!     [game]
//!     width = 5
//!     height = 5
//!
//!     [search]
//!     iterations = 4
//!     depth = 1
//!
//!     [search.weights]
//!     monotonicity_ratio = 0.5
//! "#).unwrap();
//! assert_eq!(settings.game.width, 5);
//! assert_eq!(settings.game.winning_tile, 2048);
//! assert_eq!(settings.search.weights.monotonicity_ratio, 0.5);
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{Board, BoardError, Rules, SpawnTable, Tile, DEFAULT_WINNING_TILE};
use crate::search::SearchConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("search needs at least one sampling iteration")]
    ZeroIterations,
}

/// Board shape and rules. Fixed for the lifetime of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub winning_tile: Tile,
    pub spawn: SpawnTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { width: 4, height: 4, winning_tile: DEFAULT_WINNING_TILE, spawn: SpawnTable::default() }
    }
}

impl GameConfig {
    pub fn rules(&self) -> Result<Arc<Rules>, BoardError> {
        Ok(Arc::new(Rules::new(self.spawn.clone(), self.winning_tile)?))
    }

    /// A fresh board with two spawned tiles.
    pub fn new_board<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Board, BoardError> {
        Board::with_rules(self.width, self.height, self.rules()?, rng)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub game: GameConfig,
    pub search: SearchConfig,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Board::check_dimensions(self.game.width, self.game.height)?;
        self.game.rules()?;
        if self.search.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}
