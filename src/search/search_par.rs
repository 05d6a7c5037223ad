use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::engine::{Board, Direction};

use super::{sample_once, MoveRecommendation, SearchConfig, SearchStats};

type Partial = ([f64; 4], [bool; 4], u64);

/// Sampled look-ahead with the trials spread over the rayon pool.
///
/// Each trial gets its own `StdRng`, seeded from the caller's RNG before the
/// fan-out, so a seeded caller still gets reproducible decisions.
pub struct SamplerParallel {
    cfg: SearchConfig,
    stats: SearchStats,
}

impl SamplerParallel {
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self { Self { cfg, stats: SearchStats::default() } }

    #[inline]
    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Parallel counterpart of [`super::Sampler::evaluate_directions`].
    pub fn evaluate_directions<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> MoveRecommendation {
        let seeds: Vec<u64> = (0..self.cfg.iterations).map(|_| rng.gen()).collect();
        let cfg = &self.cfg;
        let partials: Vec<Partial> = seeds
            .par_iter()
            .map(|&seed| {
                let mut trial_rng = StdRng::seed_from_u64(seed);
                let mut evaluations = 0u64;
                let trial = sample_once(board, cfg, &mut trial_rng, &mut evaluations);
                let mut totals = [0.0f64; 4];
                let mut valid = [false; 4];
                for (i, potential) in trial.into_iter().enumerate() {
                    if let Some(p) = potential {
                        totals[i] = p;
                        valid[i] = true;
                    }
                }
                (totals, valid, evaluations)
            })
            .collect();
        // Fold in trial order so float sums do not depend on thread scheduling.
        let (totals, valid, evaluations) = partials.into_iter().fold(([0.0; 4], [false; 4], 0), merge);
        self.stats.evaluations = evaluations;
        self.stats.peak_evaluations = self.stats.peak_evaluations.max(evaluations);
        MoveRecommendation::from_totals(totals, valid, self.cfg.iterations)
    }

    pub fn best_move<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> Option<Direction> {
        let rec = self.evaluate_directions(board, rng);
        for branch in &rec.branches {
            trace!("{}: valid={} score={:.2}", branch.dir, branch.valid, branch.score);
        }
        let best = rec.best();
        debug!("picked {:?} after {} evaluations (parallel)", best, self.stats.evaluations);
        best
    }

    pub fn choose_best_move<R: Rng + ?Sized>(&mut self, board: &mut Board, rng: &mut R) -> Option<Direction> {
        let dir = self.best_move(board, rng)?;
        let moved = board.make_move(dir, rng);
        debug_assert!(moved, "search picked an illegal move");
        Some(dir)
    }

    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for SamplerParallel {
    fn default() -> Self { Self::new() }
}

fn merge(a: Partial, b: Partial) -> Partial {
    let mut totals = a.0;
    let mut valid = a.1;
    for i in 0..4 {
        totals[i] += b.0[i];
        valid[i] |= b.1[i];
    }
    (totals, valid, a.2 + b.2)
}
