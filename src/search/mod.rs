//! Sampled look-ahead move selection.
//!
//! Two policy implementations share the same surface:
//! - [`Sampler`]: single-threaded.
//! - [`SamplerParallel`]: runs the sampling iterations on the rayon pool.
//!
//! Every candidate move is played on an independent copy of the board,
//! including its random spawn, and scored by the heuristic in
//! [`heuristic`]. [`potential`] then recurses as a plain max over the four
//! follow-up moves down to the configured depth. Spawn randomness is only
//! averaged at the root: each of the `iterations` trials draws fresh spawns
//! and the per-direction potentials are averaged across trials.
//!
//! Quick start
//! ```
//! use tile_merge::engine::Board;
//! use tile_merge::search::{Sampler, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(3);
//! let mut board = Board::new(4, 4, &mut rng).unwrap();
//! let mut sampler = Sampler::with_config(SearchConfig { iterations: 4, depth: 1, ..SearchConfig::default() });
//! let dir = sampler.choose_best_move(&mut board, &mut rng);
//! assert!(dir.is_some());
//! assert_eq!(board.move_count(), 1);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{Board, Direction, Score};

pub mod heuristic;
mod search_par;
mod search_seq;

pub use heuristic::Evaluation;
pub use search_par::SamplerParallel;
pub use search_seq::Sampler;

/// Coefficients of the board heuristic.
///
/// `monotonicity_ratio` is the base `r` of the geometric weighting
/// `sum(value[i] * r^i)` along each serpentine traversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationWeights {
    pub score_weight: f64,
    pub empty_tile_weight: f64,
    pub monotonicity_weight: f64,
    pub roughness_penalty_weight: f64,
    pub monotonicity_ratio: f64,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        Self {
            score_weight: 1.0,
            empty_tile_weight: 64.0,
            monotonicity_weight: 1.0,
            roughness_penalty_weight: 0.25,
            monotonicity_ratio: 0.25,
        }
    }
}

/// Search knobs. Cost per decision is roughly `iterations * 4^(depth + 1)`
/// board evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Independent sampling trials per decision.
    pub iterations: u32,
    /// Extra plies explored below each root move.
    pub depth: u32,
    pub weights: EvaluationWeights,
}

impl Default for SearchConfig {
    fn default() -> Self { Self { iterations: 8, depth: 2, weights: EvaluationWeights::default() } }
}

/// One candidate move played on a private copy of a board.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub direction: Direction,
    /// False when the move did not change the board; `board` is then an
    /// unchanged copy and `evaluation` scores that copy.
    pub legal: bool,
    pub board: Board,
    pub score_delta: Score,
    pub evaluation: Evaluation,
}

impl MoveOutcome {
    /// Play `direction` on a copy of `board` (spawn included) and score it.
    pub fn new<R: Rng + ?Sized>(board: &Board, direction: Direction, weights: &EvaluationWeights, rng: &mut R) -> Self {
        let mut next = board.clone();
        let legal = next.make_move(direction, rng);
        let evaluation = heuristic::evaluate(board.score(), &next, weights);
        Self { direction, legal, score_delta: next.score() - board.score(), board: next, evaluation }
    }

    #[inline]
    pub fn move_score(&self) -> f64 { self.evaluation.move_score }
}

/// Averaged potential of one root direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionScore {
    pub dir: Direction,
    pub score: f64,
    pub valid: bool,
}

/// Per-direction averaged potentials in `Direction::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRecommendation {
    pub branches: [DirectionScore; 4],
}

impl MoveRecommendation {
    /// Divide accumulated totals by the number of trials.
    pub(crate) fn from_totals(totals: [f64; 4], valid: [bool; 4], iterations: u32) -> Self {
        let n = f64::from(iterations.max(1));
        let branches = Direction::ALL.map(|dir| {
            let i = dir.index();
            DirectionScore { dir, score: totals[i] / n, valid: valid[i] }
        });
        Self { branches }
    }

    /// The valid direction with the strictly greatest score; earlier
    /// directions win ties.
    pub fn best(&self) -> Option<Direction> {
        let mut best: Option<&DirectionScore> = None;
        for branch in self.branches.iter().filter(|b| b.valid) {
            match best {
                Some(cur) if branch.score <= cur.score => {}
                Some(cur) if cur.score.is_nan() || branch.score.is_nan() => {}
                _ => best = Some(branch),
            }
        }
        best.map(|b| b.dir)
    }
}

/// Basic search stats for a single decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Boards scored by the heuristic during the last decision.
    pub evaluations: u64,
    pub peak_evaluations: u64,
}

/// Play all four directions on independent copies of `board`.
pub fn expand<R: Rng + ?Sized>(
    board: &Board,
    weights: &EvaluationWeights,
    rng: &mut R,
    evaluations: &mut u64,
) -> [MoveOutcome; 4] {
    *evaluations += 4;
    Direction::ALL.map(|dir| MoveOutcome::new(board, dir, weights, rng))
}

/// Depth-limited max over follow-up moves.
///
/// Illegal outcomes and exhausted depth are terminal and return their own
/// move score.
pub fn potential<R: Rng + ?Sized>(
    outcome: &MoveOutcome,
    depth: u32,
    weights: &EvaluationWeights,
    rng: &mut R,
    evaluations: &mut u64,
) -> f64 {
    if depth == 0 || !outcome.legal {
        return outcome.move_score();
    }
    let children = expand(&outcome.board, weights, rng, evaluations);
    let best = children
        .iter()
        .map(|child| potential(child, depth - 1, weights, rng, evaluations))
        .fold(f64::NEG_INFINITY, f64::max);
    outcome.move_score() + best
}

/// One sampling trial: per-direction potential for every legal root move.
fn sample_once<R: Rng + ?Sized>(
    board: &Board,
    cfg: &SearchConfig,
    rng: &mut R,
    evaluations: &mut u64,
) -> [Option<f64>; 4] {
    let outcomes = expand(board, &cfg.weights, rng, evaluations);
    let mut out = [None; 4];
    for outcome in outcomes.iter().filter(|o| o.legal) {
        out[outcome.direction.index()] = Some(potential(outcome, cfg.depth, &cfg.weights, rng, evaluations));
    }
    out
}

/// Pick the best direction with a one-off [`Sampler`] and apply it to `board`.
///
/// Returns `None`, leaving the board untouched, when no direction is legal.
pub fn choose_best_move<R: Rng + ?Sized>(
    board: &mut Board,
    iterations: u32,
    depth: u32,
    weights: EvaluationWeights,
    rng: &mut R,
) -> Option<Direction> {
    Sampler::with_config(SearchConfig { iterations, depth, weights }).choose_best_move(board, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Rules;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Arc;

    fn board(width: usize, height: usize, cells: Vec<u32>) -> Board {
        Board::from_cells(width, height, cells, Arc::new(Rules::default())).unwrap()
    }

    fn rec(scores: [f64; 4], valid: [bool; 4]) -> MoveRecommendation {
        MoveRecommendation::from_totals(scores, valid, 1)
    }

    #[test]
    fn best_prefers_strictly_greater() {
        assert_eq!(rec([1.0, 3.0, 2.0, 0.0], [true; 4]).best(), Some(Direction::Down));
        assert_eq!(rec([1.0, 3.0, 2.0, 9.0], [true, true, true, false]).best(), Some(Direction::Down));
    }

    #[test]
    fn best_breaks_ties_in_fixed_order() {
        assert_eq!(rec([5.0, 5.0, 5.0, 5.0], [true; 4]).best(), Some(Direction::Up));
        assert_eq!(rec([5.0, 2.0, 7.0, 7.0], [false, true, true, true]).best(), Some(Direction::Left));
    }

    #[test]
    fn best_without_valid_directions() {
        assert_eq!(rec([1.0; 4], [false; 4]).best(), None);
    }

    #[test]
    fn best_handles_negative_scores() {
        assert_eq!(rec([-10.0, -3.0, -7.0, 0.0], [true, true, true, false]).best(), Some(Direction::Down));
    }

    #[test]
    fn averages_over_iterations() {
        let r = MoveRecommendation::from_totals([8.0, 4.0, 0.0, 2.0], [true; 4], 4);
        let scores: Vec<f64> = r.branches.iter().map(|b| b.score).collect();
        assert_eq!(scores, vec![2.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn expand_uses_independent_copies() {
        let mut rng = StdRng::seed_from_u64(21);
        let b = board(4, 4, vec![2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let before = b.clone();
        let mut evals = 0;
        let outcomes = expand(&b, &EvaluationWeights::default(), &mut rng, &mut evals);
        assert_eq!(b, before);
        assert_eq!(evals, 4);
        let dirs: Vec<Direction> = outcomes.iter().map(|o| o.direction).collect();
        assert_eq!(dirs, Direction::ALL.to_vec());
        // Up is illegal: both tiles already sit on the top edge.
        assert!(!outcomes[Direction::Up.index()].legal);
        assert_eq!(outcomes[Direction::Up.index()].board, before);
        assert!(outcomes[Direction::Left.index()].legal);
        assert_eq!(outcomes[Direction::Left.index()].score_delta, 4);
        assert_eq!(outcomes[Direction::Left.index()].board.move_count(), 1);
    }

    #[test]
    fn potential_is_terminal_at_depth_zero_or_illegal() {
        let mut rng = StdRng::seed_from_u64(22);
        let b = board(2, 2, vec![2, 4, 0, 0]);
        let w = EvaluationWeights::default();
        let mut evals = 0;
        let outcomes = expand(&b, &w, &mut rng, &mut evals);
        let up = &outcomes[Direction::Up.index()];
        assert!(!up.legal);
        assert_eq!(potential(up, 5, &w, &mut rng, &mut evals), up.move_score());
        let down = &outcomes[Direction::Down.index()];
        assert_eq!(potential(down, 0, &w, &mut rng, &mut evals), down.move_score());
        assert_eq!(evals, 4);
    }

    #[test]
    fn potential_adds_best_child() {
        let mut rng = StdRng::seed_from_u64(23);
        let b = board(4, 4, vec![2, 2, 4, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let w = EvaluationWeights::default();
        let mut evals = 0;
        let outcomes = expand(&b, &w, &mut rng, &mut evals);
        let left = &outcomes[Direction::Left.index()];
        let mut child_rng = rng.clone();
        let mut child_evals = 0;
        let children = expand(&left.board, &w, &mut child_rng, &mut child_evals);
        let best_child = children.iter().map(|c| c.move_score()).fold(f64::NEG_INFINITY, f64::max);
        let got = potential(left, 1, &w, &mut rng, &mut evals);
        assert_eq!(got, left.move_score() + best_child);
        assert_eq!(evals, 8);
    }

    #[test]
    fn free_function_applies_move() {
        let mut rng = StdRng::seed_from_u64(24);
        let mut b = board(4, 4, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 2]);
        let dir = choose_best_move(&mut b, 2, 1, EvaluationWeights::default(), &mut rng);
        assert!(dir.is_some());
        assert_eq!(b.move_count(), 1);
    }

    #[test]
    fn no_move_on_dead_board() {
        let mut rng = StdRng::seed_from_u64(25);
        let mut b = board(2, 2, vec![2, 4, 4, 2]);
        let before = b.clone();
        assert_eq!(choose_best_move(&mut b, 3, 2, EvaluationWeights::default(), &mut rng), None);
        assert_eq!(b, before);
    }

    #[test]
    fn zero_iterations_is_no_move() {
        let mut rng = StdRng::seed_from_u64(26);
        let mut b = board(2, 2, vec![2, 0, 0, 0]);
        assert_eq!(choose_best_move(&mut b, 0, 2, EvaluationWeights::default(), &mut rng), None);
        assert_eq!(b.move_count(), 0);
    }
}
