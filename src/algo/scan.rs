//! Pair selection strategies for the Neighbor-Joining loop.
//!
//! Both strategies minimize the Q-criterion
//! `Q(i,j) = d(i,j) - (divergence(i) + divergence(j)) / (live - 2)`
//! and break ties by the lowest `(col, row)` pair in canonical order
//! (`col < row`). [ExhaustiveScan] evaluates every pair, parallelized
//! per row; [RowBoundScan] (the "-R" rapid variant) keeps per-row
//! minimum caches and skips rows whose best possible Q cannot reach the
//! best pair found so far. Pruning is purely a performance layer: both
//! strategies evaluate Q with the same expression and comparator, and
//! the bound cutoff keeps equal-Q candidates, so they always select the
//! identical pair.

use crate::algo::cluster::ClusterRegistry;
use crate::matrix::DistanceMatrix;
use rayon::prelude::*;

// =#========================================================================#=
// SELECTED PAIR
// =#========================================================================#=
/// A candidate join: matrix rows `col < row` with their Q score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// Smaller row index of the pair
    pub col: usize,
    /// Larger row index of the pair
    pub row: usize,
    /// Q score of the pair
    pub q: f64,
}

impl Pair {
    fn none() -> Self {
        Pair {
            col: 0,
            row: 0,
            q: f64::INFINITY,
        }
    }
}

/// The shared Q expression. Both strategies must call this with the same
/// operands so that float results (and therefore ties) are bit-identical.
#[inline]
fn q_score(distance: f64, div_col: f64, div_row: f64, scale: f64) -> f64 {
    distance - (div_col + div_row) * scale
}

/// The shared comparator: strictly smaller Q wins; equal Q falls back to
/// the canonically smallest index pair.
#[inline]
fn better_than(q: f64, col: usize, row: usize, best: &Pair) -> bool {
    q < best.q || (q == best.q && (col, row) < (best.col, best.row))
}

// =#========================================================================#=
// PAIR SCANNER (trait)
// =#========================================================================#=
/// Strategy interface for selecting the next pair of rows to join.
///
/// `select` is only called while more than three clusters are live, so
/// `live - 2 > 1` and the Q denominator is never degenerate.
pub trait PairScanner: Send {
    /// Returns the pair minimizing Q, ties broken canonically.
    fn select(&mut self, matrix: &DistanceMatrix, registry: &ClusterRegistry) -> Pair;

    /// Notifies the scanner that rows `a` and `b` were merged: the new
    /// cluster was written over row `a`, and row `b` was swap-removed
    /// (the former last row now occupies it, unless `b` was last).
    fn after_merge(&mut self, _matrix: &DistanceMatrix, _a: usize, _b: usize) {}
}

// =#========================================================================#=
// EXHAUSTIVE SCAN ("NJ")
// =#========================================================================#=
/// Evaluates Q for every live pair, one rayon task per row.
///
/// Per-row bests are folded in ascending row order afterwards, so the
/// result is deterministic regardless of worker scheduling.
pub struct ExhaustiveScan;

impl PairScanner for ExhaustiveScan {
    fn select(&mut self, matrix: &DistanceMatrix, registry: &ClusterRegistry) -> Pair {
        let live = matrix.size();
        debug_assert!(live > 3);
        let scale = 1.0 / (live - 2) as f64;

        let row_bests: Vec<Pair> = (1..live)
            .into_par_iter()
            .map(|row| {
                let div_row = registry.divergence(row);
                let mut best = Pair::none();
                for col in 0..row {
                    let q = q_score(
                        matrix.distance(row, col),
                        registry.divergence(col),
                        div_row,
                        scale,
                    );
                    if better_than(q, col, row, &best) {
                        best = Pair { col, row, q };
                    }
                }
                best
            })
            .collect();

        let mut best = Pair::none();
        for candidate in row_bests {
            if better_than(candidate.q, candidate.col, candidate.row, &best) {
                best = candidate;
            }
        }
        best
    }
}

// =#========================================================================#=
// ROW BOUND SCAN ("NJ-R")
// =#========================================================================#=
/// Candidate-pruned scan for the rapid variant.
///
/// Maintains, for every live row, the smallest off-diagonal distance in
/// that row and its column. For row `r`,
/// `Q(c,r) >= row_min(r) - (divergence(r) + max_divergence) * scale`
/// for every column `c`, so rows are visited in ascending order of that
/// bound and the scan stops once the bound exceeds the best Q found.
/// Rows whose bound *equals* the best Q are still scanned, preserving
/// exhaustive tie-break semantics.
pub struct RowBoundScan {
    /// Smallest off-diagonal entry of each live row
    row_min: Vec<f64>,
    /// Column of that entry
    row_min_col: Vec<usize>,
}

impl RowBoundScan {
    /// Builds the per-row minimum caches for the initial matrix.
    pub fn new(matrix: &DistanceMatrix) -> Self {
        let live = matrix.size();
        let mut scan = RowBoundScan {
            row_min: vec![f64::INFINITY; live],
            row_min_col: vec![0; live],
        };
        for row in 0..live {
            scan.recompute_row(matrix, row);
        }
        scan
    }

    /// Rescans row `row` for its minimum entry and column.
    fn recompute_row(&mut self, matrix: &DistanceMatrix, row: usize) {
        let live = matrix.size();
        let mut min = f64::INFINITY;
        let mut min_col = 0;
        for col in 0..live {
            if col == row {
                continue;
            }
            let d = matrix.distance(row, col);
            if d < min {
                min = d;
                min_col = col;
            }
        }
        self.row_min[row] = min;
        self.row_min_col[row] = min_col;
    }
}

impl PairScanner for RowBoundScan {
    fn select(&mut self, matrix: &DistanceMatrix, registry: &ClusterRegistry) -> Pair {
        let live = matrix.size();
        debug_assert!(live > 3);
        let scale = 1.0 / (live - 2) as f64;
        let max_divergence = registry.max_divergence();

        // Lower bound on the Q of any pair in each row's scan range
        let mut order: Vec<usize> = (1..live).collect();
        let bound = |row: usize| -> f64 {
            self.row_min[row] - (registry.divergence(row) + max_divergence) * scale
        };
        order.sort_by(|&a, &b| bound(a).total_cmp(&bound(b)));

        let mut best = Pair::none();
        for &row in &order {
            if bound(row) > best.q {
                break;
            }
            let div_row = registry.divergence(row);
            for col in 0..row {
                let q = q_score(
                    matrix.distance(row, col),
                    registry.divergence(col),
                    div_row,
                    scale,
                );
                if better_than(q, col, row, &best) {
                    best = Pair { col, row, q };
                }
            }
        }
        best
    }

    fn after_merge(&mut self, matrix: &DistanceMatrix, a: usize, b: usize) {
        let live = matrix.size();
        let old_last = live; // index of the row that was moved into `b`

        self.row_min.truncate(live);
        self.row_min_col.truncate(live);

        for row in 0..live {
            if row == a || row == b {
                self.recompute_row(matrix, row);
                continue;
            }
            let min_col = self.row_min_col[row];
            if min_col == a || min_col == b {
                // The cached minimum pointed at one of the merged
                // clusters; its value is gone.
                self.recompute_row(matrix, row);
                continue;
            }
            if min_col == old_last {
                self.row_min_col[row] = b;
            }
            // Only the new cluster's column can lower a still-valid minimum
            let d = matrix.distance(row, a);
            if d < self.row_min[row] {
                self.row_min[row] = d;
                self.row_min_col[row] = a;
            }
        }
    }
}

// =$========================================================================$=
// TESTS
// =$========================================================================$=
#[cfg(test)]
mod tests {
    use super::*;

    fn setup(data: &[f64], n: usize) -> (DistanceMatrix, ClusterRegistry) {
        let matrix = DistanceMatrix::from_flat(n, data).unwrap();
        let totals = matrix.row_totals();
        let registry = ClusterRegistry::new((0..n).collect(), totals);
        (matrix, registry)
    }

    // Five-taxon additive matrix with a clear closest pair (0, 1)
    fn additive_5x5() -> Vec<f64> {
        vec![
            0.0, 2.0, 7.0, 7.0, 8.0, //
            2.0, 0.0, 7.0, 7.0, 8.0, //
            7.0, 7.0, 0.0, 4.0, 7.0, //
            7.0, 7.0, 4.0, 0.0, 7.0, //
            8.0, 8.0, 7.0, 7.0, 0.0,
        ]
    }

    #[test]
    fn both_scans_agree_on_selection() {
        let data = additive_5x5();
        let (matrix, registry) = setup(&data, 5);

        let exhaustive = ExhaustiveScan.select(&matrix, &registry);
        let pruned = RowBoundScan::new(&matrix).select(&matrix, &registry);

        assert_eq!(exhaustive, pruned);
    }

    #[test]
    fn tie_break_picks_lowest_pair() {
        // Fully symmetric input: every pair has the same Q
        let data = vec![
            0.0, 1.0, 1.0, 1.0, //
            1.0, 0.0, 1.0, 1.0, //
            1.0, 1.0, 0.0, 1.0, //
            1.0, 1.0, 1.0, 0.0,
        ];
        let (matrix, registry) = setup(&data, 4);

        let pair = ExhaustiveScan.select(&matrix, &registry);
        assert_eq!((pair.col, pair.row), (0, 1));

        let pruned = RowBoundScan::new(&matrix).select(&matrix, &registry);
        assert_eq!((pruned.col, pruned.row), (0, 1));
    }

    #[test]
    fn row_cache_survives_swap_removal() {
        let data = additive_5x5();
        let (mut matrix, _registry) = setup(&data, 5);
        let mut scan = RowBoundScan::new(&matrix);

        // Fake a merge of rows (0, 1): write a new row over 0, drop 1
        for k in 2..5 {
            let d = 0.5 * (matrix.distance(0, k) + matrix.distance(1, k) - matrix.distance(0, 1));
            matrix.set_distance(0, k, d);
        }
        matrix.remove_row_and_column(1);
        scan.after_merge(&matrix, 0, 1);

        for row in 0..matrix.size() {
            assert_eq!(scan.row_min[row], matrix.row_min(row), "row {row}");
        }
    }
}
