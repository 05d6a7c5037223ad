//! Board heuristic: score gained, free cells, monotonic ordering and
//! neighbour roughness.

use crate::engine::{Board, Coordinate, Direction, Score, Tile};

use super::EvaluationWeights;

/// Heuristic breakdown for one hypothetical board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub score_difference: f64,
    pub num_empty_tiles: usize,
    pub monotonicity: f64,
    pub roughness_penalty: f64,
    pub move_score: f64,
}

/// Score `board`, the result of a candidate move from a board whose score
/// was `score_before`.
pub fn evaluate(score_before: Score, board: &Board, weights: &EvaluationWeights) -> Evaluation {
    let score_difference = board.score().saturating_sub(score_before) as f64;
    let num_empty_tiles = board.empty_cells().len();
    let monotonicity = monotonicity(board, weights.monotonicity_ratio);
    let roughness_penalty = roughness_penalty(board);
    let move_score = score_difference * weights.score_weight
        + num_empty_tiles as f64 * weights.empty_tile_weight
        + monotonicity * weights.monotonicity_weight
        - roughness_penalty * weights.roughness_penalty_weight;
    Evaluation { score_difference, num_empty_tiles, monotonicity, roughness_penalty, move_score }
}

/// Best geometric order score over the eight serpentine traversals.
pub fn monotonicity(board: &Board, ratio: f64) -> f64 {
    let mut best = f64::NEG_INFINITY;
    for column_major in [true, false] {
        for other_side in [false, true] {
            for reversed in [false, true] {
                let path = unfold(board, column_major, other_side, reversed);
                best = best.max(order_score(&path, ratio));
            }
        }
    }
    best
}

/// Flatten the board along a serpentine path.
///
/// Column-major paths walk whole columns, row-major paths whole rows.
/// `other_side` starts from the far column/row, `reversed` flips the
/// direction of the first line; every following line alternates.
pub fn unfold(board: &Board, column_major: bool, other_side: bool, reversed: bool) -> Vec<Tile> {
    let (w, h) = (board.width() as i32, board.height() as i32);
    let (outer, inner) = if column_major { (w, h) } else { (h, w) };
    let mut path = Vec::with_capacity(board.cells().len());
    let mut flip = reversed;
    for i in 0..outer {
        let line = if other_side { outer - 1 - i } else { i };
        for j in 0..inner {
            let along = if flip { inner - 1 - j } else { j };
            let coord = if column_major { Coordinate::new(line, along) } else { Coordinate::new(along, line) };
            path.push(board.cell_value(coord).unwrap_or(0));
        }
        flip = !flip;
    }
    path
}

/// `sum(path[i] * ratio^i)`.
pub fn order_score(path: &[Tile], ratio: f64) -> f64 {
    let mut weight = 1.0;
    let mut score = 0.0;
    for &tile in path {
        score += f64::from(tile) * weight;
        weight *= ratio;
    }
    score
}

/// Sum over every cell of the absolute difference to each on-board
/// orthogonal neighbour. Shared edges are counted from both ends.
pub fn roughness_penalty(board: &Board) -> f64 {
    let mut penalty = 0.0;
    for coord in board.coords() {
        let tile = f64::from(board.cell_value(coord).unwrap_or(0));
        for dir in Direction::ALL {
            if let Some(next) = board.cell_value(coord.step(dir)) {
                penalty += (tile - f64::from(next)).abs();
            }
        }
    }
    penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Rules;
    use std::sync::Arc;

    fn board(width: usize, height: usize, cells: Vec<Tile>) -> Board {
        Board::from_cells(width, height, cells, Arc::new(Rules::default())).unwrap()
    }

    #[test]
    fn unfold_serpentines() {
        // rows: [2 4] [8 16] [32 64]
        let b = board(2, 3, vec![2, 4, 8, 16, 32, 64]);
        assert_eq!(unfold(&b, true, false, false), vec![2, 8, 32, 64, 16, 4]);
        assert_eq!(unfold(&b, true, true, false), vec![4, 16, 64, 32, 8, 2]);
        assert_eq!(unfold(&b, true, false, true), vec![32, 8, 2, 4, 16, 64]);
        assert_eq!(unfold(&b, false, false, false), vec![2, 4, 16, 8, 32, 64]);
        assert_eq!(unfold(&b, false, true, true), vec![64, 32, 8, 16, 4, 2]);
    }

    #[test]
    fn eight_traversals_are_distinct() {
        let b = board(3, 3, vec![2, 4, 8, 16, 32, 64, 128, 256, 512]);
        let mut paths = Vec::new();
        for column_major in [true, false] {
            for other_side in [false, true] {
                for reversed in [false, true] {
                    paths.push(unfold(&b, column_major, other_side, reversed));
                }
            }
        }
        for i in 0..paths.len() {
            for j in i + 1..paths.len() {
                assert_ne!(paths[i], paths[j], "paths {i} and {j}");
            }
        }
    }

    #[test]
    fn order_score_is_geometric() {
        assert_eq!(order_score(&[8, 4, 2], 0.5), 8.0 + 2.0 + 0.5);
        assert_eq!(order_score(&[], 0.5), 0.0);
    }

    #[test]
    fn monotonicity_picks_best_corner() {
        // Big tile in the bottom-right corner.
        let b = board(2, 2, vec![0, 2, 4, 64]);
        let m = monotonicity(&b, 0.5);
        assert_eq!(m, 64.0 + 4.0 * 0.5 + 0.0 + 2.0 * 0.125);
    }

    #[test]
    fn roughness_counts_edges_twice() {
        let b = board(2, 1, vec![2, 8]);
        assert_eq!(roughness_penalty(&b), 12.0);
        let flat = board(2, 2, vec![4, 4, 4, 4]);
        assert_eq!(roughness_penalty(&flat), 0.0);
        let b = board(3, 1, vec![2, 0, 2]);
        assert_eq!(roughness_penalty(&b), 8.0);
    }

    #[test]
    fn evaluate_combines_terms() {
        let b = board(2, 1, vec![2, 8]);
        let w = EvaluationWeights {
            score_weight: 2.0,
            empty_tile_weight: 10.0,
            monotonicity_weight: 1.0,
            roughness_penalty_weight: 0.5,
            monotonicity_ratio: 0.5,
        };
        let e = evaluate(0, &b, &w);
        assert_eq!(e.score_difference, 0.0);
        assert_eq!(e.num_empty_tiles, 0);
        assert_eq!(e.monotonicity, 8.0 + 1.0);
        assert_eq!(e.roughness_penalty, 12.0);
        assert_eq!(e.move_score, 9.0 - 6.0);
    }
}
