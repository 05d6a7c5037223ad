//! tile-merge: a sliding-tile merge puzzle engine + sampled look-ahead player
//!
//! This crate provides:
//! - A variable-size `Board` with the slide/merge/spawn rules (`engine` module)
//! - A heuristic evaluator and a depth-limited search that averages over
//!   randomly sampled spawns (`search` module), single-threaded and parallel
//! - TOML settings (`config` module) and JSON game records (`record` module)
//!
//! Full loop (simplest possible)
//! ```
//! use tile_merge::engine::Board;
//! use tile_merge::search::{Sampler, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // 1) Seeded RNG and a policy
//! let mut rng = StdRng::seed_from_u64(123);
//! let mut policy = Sampler::with_config(SearchConfig { iterations: 2, depth: 1, ..SearchConfig::default() });
//!
//! // 2) Board with two random tiles
//! let mut board = Board::new(4, 4, &mut rng).unwrap();
//!
//! // 3) Let the policy play a few moves (keep doctests fast)
//! while !board.is_game_over() && board.move_count() < 4 {
//!     if policy.choose_best_move(&mut board, &mut rng).is_none() {
//!         break;
//!     }
//! }
//!
//! // 4) Inspect the result
//! assert_eq!(board.move_count(), 4);
//! let _ = (board.score(), board.has_won(), board.highest_tile());
//! ```
//!
pub mod config;
pub mod engine;
pub mod record;
pub mod search;
