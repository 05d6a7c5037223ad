use log::{debug, trace};
use rand::Rng;

use crate::engine::{Board, Direction};

use super::{sample_once, MoveRecommendation, SearchConfig, SearchStats};

/// Single-threaded sampled look-ahead.
pub struct Sampler {
    cfg: SearchConfig,
    stats: SearchStats,
}

impl Sampler {
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self { Self { cfg, stats: SearchStats::default() } }

    #[inline]
    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Average each direction's potential over `iterations` independent
    /// trials, each with freshly drawn spawns.
    ///
    /// Returns a fixed array in order `[Up, Down, Left, Right]`; directions
    /// that were never legal stay `valid = false`.
    ///
    /// ```
    /// use tile_merge::engine::Board;
    /// use tile_merge::search::Sampler;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(9);
    /// let b = Board::new(4, 4, &mut rng).unwrap();
    /// let rec = Sampler::new().evaluate_directions(&b, &mut rng);
    /// assert!(rec.branches.iter().any(|d| d.valid));
    /// ```
    pub fn evaluate_directions<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> MoveRecommendation {
        let mut totals = [0.0f64; 4];
        let mut valid = [false; 4];
        let mut evaluations = 0u64;
        for _ in 0..self.cfg.iterations {
            let trial = sample_once(board, &self.cfg, rng, &mut evaluations);
            for (i, potential) in trial.into_iter().enumerate() {
                if let Some(p) = potential {
                    totals[i] += p;
                    valid[i] = true;
                }
            }
        }
        self.stats.evaluations = evaluations;
        self.stats.peak_evaluations = self.stats.peak_evaluations.max(evaluations);
        MoveRecommendation::from_totals(totals, valid, self.cfg.iterations)
    }

    /// Best direction for `board` without touching it.
    pub fn best_move<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> Option<Direction> {
        let rec = self.evaluate_directions(board, rng);
        for branch in &rec.branches {
            trace!("{}: valid={} score={:.2}", branch.dir, branch.valid, branch.score);
        }
        let best = rec.best();
        debug!("picked {:?} after {} evaluations", best, self.stats.evaluations);
        best
    }

    /// Pick the best direction and play it on the live board.
    ///
    /// Returns `None`, leaving the board untouched, when no direction is
    /// legal.
    pub fn choose_best_move<R: Rng + ?Sized>(&mut self, board: &mut Board, rng: &mut R) -> Option<Direction> {
        let dir = self.best_move(board, rng)?;
        let moved = board.make_move(dir, rng);
        debug_assert!(moved, "search picked an illegal move");
        Some(dir)
    }

    /// Statistics from the last call to [`Self::evaluate_directions`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for Sampler {
    fn default() -> Self { Self::new() }
}
