//! Weighted tile spawning.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Coordinate, Tile};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnTableError {
    #[error("spawn table has no entries")]
    Empty,
    #[error("spawn table has {values} values but {weights} weights")]
    LengthMismatch { values: usize, weights: usize },
    #[error("spawn weights sum to zero")]
    ZeroTotal,
    #[error("spawn value {0} is not a power of two")]
    InvalidValue(Tile),
}

/// Discrete distribution of freshly spawned tile values.
///
/// `values[i]` is drawn with weight `weights[i]`; weights need not sum to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSpawnTable", into = "RawSpawnTable")]
pub struct SpawnTable {
    values: Vec<Tile>,
    weights: Vec<u32>,
    total: u64,
}

#[derive(Serialize, Deserialize)]
struct RawSpawnTable {
    values: Vec<Tile>,
    weights: Vec<u32>,
}

impl TryFrom<RawSpawnTable> for SpawnTable {
    type Error = SpawnTableError;
    fn try_from(raw: RawSpawnTable) -> Result<Self, Self::Error> { SpawnTable::new(raw.values, raw.weights) }
}

impl From<SpawnTable> for RawSpawnTable {
    fn from(t: SpawnTable) -> Self { RawSpawnTable { values: t.values, weights: t.weights } }
}

impl SpawnTable {
    pub fn new(values: Vec<Tile>, weights: Vec<u32>) -> Result<Self, SpawnTableError> {
        if values.len() != weights.len() {
            return Err(SpawnTableError::LengthMismatch { values: values.len(), weights: weights.len() });
        }
        if values.is_empty() {
            return Err(SpawnTableError::Empty);
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_power_of_two()) {
            return Err(SpawnTableError::InvalidValue(bad));
        }
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        if total == 0 {
            return Err(SpawnTableError::ZeroTotal);
        }
        Ok(Self { values, weights, total })
    }

    #[inline]
    pub fn values(&self) -> &[Tile] { &self.values }

    #[inline]
    pub fn weights(&self) -> &[u32] { &self.weights }

    #[inline]
    pub fn total_weight(&self) -> u64 { self.total }

    /// Draw a tile value by inverse-CDF sampling.
    ///
    /// The draw is uniform over `0..=total`; every entry but the last owns
    /// the half-open range `[min, min + weight)` of the running sum and the
    /// last entry takes whatever is left, including the top value `total`.
    pub fn pick_value<R: Rng + ?Sized>(&self, rng: &mut R) -> Tile {
        let draw = rng.gen_range(0..=self.total);
        let last = self.values.len() - 1;
        let mut range_min = 0u64;
        for (&value, &weight) in self.values[..last].iter().zip(&self.weights) {
            let range_max = range_min + u64::from(weight);
            if (range_min..range_max).contains(&draw) {
                return value;
            }
            range_min = range_max;
        }
        self.values[last]
    }
}

impl Default for SpawnTable {
    /// 2 with weight 90, 4 with weight 10.
    fn default() -> Self { Self { values: vec![2, 4], weights: vec![90, 10], total: 100 } }
}

/// Uniformly pick one of `empty`.
///
/// # Panics
/// If `empty` is empty: spawning on a full board means a move was applied
/// without checking its legality first.
pub fn pick_cell<R: Rng + ?Sized>(empty: &[Coordinate], rng: &mut R) -> Coordinate {
    assert!(!empty.is_empty(), "tile spawn attempted on a full board");
    empty[rng.gen_range(0..empty.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn frequencies(table: &SpawnTable, draws: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts = vec![0usize; table.values().len()];
        for _ in 0..draws {
            let v = table.pick_value(&mut rng);
            let idx = table.values().iter().position(|&x| x == v).unwrap();
            counts[idx] += 1;
        }
        counts.into_iter().map(|c| c as f64 / draws as f64).collect()
    }

    #[test]
    fn default_table_matches_weights() {
        let freq = frequencies(&SpawnTable::default(), 200_000, 11);
        assert!((freq[0] - 0.9).abs() < 0.02, "{freq:?}");
        assert!((freq[1] - 0.1).abs() < 0.02, "{freq:?}");
    }

    #[test]
    fn three_way_table_uses_running_sum() {
        let table = SpawnTable::new(vec![2, 4, 8], vec![50, 30, 20]).unwrap();
        let freq = frequencies(&table, 200_000, 12);
        assert!((freq[0] - 0.5).abs() < 0.02, "{freq:?}");
        assert!((freq[1] - 0.3).abs() < 0.02, "{freq:?}");
        assert!((freq[2] - 0.2).abs() < 0.02, "{freq:?}");
    }

    #[test]
    fn zero_weight_entry_is_never_drawn() {
        let table = SpawnTable::new(vec![2, 4], vec![0, 10]).unwrap();
        let mut rng = StdRng::seed_from_u64(13);
        assert!((0..10_000).all(|_| table.pick_value(&mut rng) == 4));
    }

    #[test]
    fn single_entry_table() {
        let table = SpawnTable::new(vec![8], vec![3]).unwrap();
        let mut rng = StdRng::seed_from_u64(14);
        assert!((0..100).all(|_| table.pick_value(&mut rng) == 8));
    }

    #[test]
    fn rejects_malformed_tables() {
        assert_eq!(SpawnTable::new(vec![], vec![]).unwrap_err(), SpawnTableError::Empty);
        assert_eq!(
            SpawnTable::new(vec![2, 4], vec![1]).unwrap_err(),
            SpawnTableError::LengthMismatch { values: 2, weights: 1 }
        );
        assert_eq!(SpawnTable::new(vec![2, 4], vec![0, 0]).unwrap_err(), SpawnTableError::ZeroTotal);
        assert_eq!(SpawnTable::new(vec![2, 6], vec![1, 1]).unwrap_err(), SpawnTableError::InvalidValue(6));
    }

    #[test]
    fn deserialize_validates() {
        let ok: SpawnTable = serde_json::from_str(r#"{"values":[2,4],"weights":[9,1]}"#).unwrap();
        assert_eq!(ok.total_weight(), 10);
        assert!(serde_json::from_str::<SpawnTable>(r#"{"values":[2],"weights":[0]}"#).is_err());
    }

    #[test]
    fn pick_cell_is_uniform_over_candidates() {
        let cells = [Coordinate::new(0, 0), Coordinate::new(1, 1), Coordinate::new(2, 0)];
        let mut rng = StdRng::seed_from_u64(15);
        let mut seen = [0usize; 3];
        for _ in 0..3_000 {
            let c = pick_cell(&cells, &mut rng);
            seen[cells.iter().position(|&x| x == c).unwrap()] += 1;
        }
        assert!(seen.iter().all(|&n| n > 800), "{seen:?}");
    }

    #[test]
    #[should_panic(expected = "full board")]
    fn pick_cell_on_full_board_panics() {
        let mut rng = StdRng::seed_from_u64(16);
        pick_cell(&[], &mut rng);
    }
}
