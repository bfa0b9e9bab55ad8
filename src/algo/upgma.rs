//! The UPGMA engine (unweighted pair group method with arithmetic mean).
//!
//! Simpler than Neighbor-Joining: repeatedly join the two clusters with
//! the smallest raw distance, place the new cluster at height
//! `d(i,j) / 2`, and average its distances to the rest weighted by leaf
//! counts. The loop runs down to two clusters, which join under a
//! binary root, so the output is rooted and (for clock-like input)
//! ultrametric.

use crate::algo::Diagnostics;
use crate::algo::cluster::ClusterRegistry;
use crate::error::ConstructError;
use crate::matrix::DistanceMatrix;
use crate::model::tree::PhyloTree;
use crate::model::vertex::BranchLength;
use log::debug;
use rayon::prelude::*;

/// Runs UPGMA over `matrix`, which must have at least three rows
/// (validated by the caller).
///
/// # Errors
/// [ConstructError::NonFiniteDistance] if a distance update blows up.
pub fn run(mut matrix: DistanceMatrix) -> Result<(PhyloTree, Diagnostics), ConstructError> {
    let n = matrix.size();
    debug_assert!(n >= 3);

    let mut tree = PhyloTree::new(n);
    let leaves: Vec<_> = (0..n).map(|taxon| tree.add_leaf(taxon)).collect();
    let mut registry = ClusterRegistry::new(leaves, matrix.row_totals());
    let mut diagnostics = Diagnostics::default();

    while matrix.size() > 2 {
        let (a, b) = closest_pair(&matrix);
        merge(&mut matrix, &mut registry, &mut tree, &mut diagnostics, a, b)?;
    }

    // Final two clusters join under the root at half their distance
    let half = 0.5 * matrix.distance(0, 1);
    let mut children = Vec::with_capacity(2);
    for row in 0..2 {
        let vertex = registry.vertex_of(row);
        let length = half - registry.height(row);
        tree.set_branch_length(vertex, clamped(length, &mut diagnostics));
        children.push(vertex);
    }
    tree.add_root(children);

    Ok((tree, diagnostics))
}

/// Returns the live pair `(col, row)` with the smallest distance, ties
/// broken by the canonically lowest index pair. One rayon task per row,
/// folded in row order for determinism.
fn closest_pair(matrix: &DistanceMatrix) -> (usize, usize) {
    let live = matrix.size();

    // Same comparator shape as the Neighbor-Joining scans: strictly
    // smaller distance wins, equal distance falls back to the
    // canonically smallest (col, row) pair.
    let closer = |d: f64, col: usize, row: usize, best: &(usize, usize, f64)| {
        d < best.2 || (d == best.2 && (col, row) < (best.0, best.1))
    };

    let row_bests: Vec<(usize, usize, f64)> = (1..live)
        .into_par_iter()
        .map(|row| {
            let mut best = (0usize, row, f64::INFINITY);
            for col in 0..row {
                let d = matrix.distance(row, col);
                if closer(d, col, row, &best) {
                    best = (col, row, d);
                }
            }
            best
        })
        .collect();

    let mut best = (0usize, 0usize, f64::INFINITY);
    for candidate in row_bests {
        if closer(candidate.2, candidate.0, candidate.1, &best) {
            best = candidate;
        }
    }
    (best.0, best.1)
}

/// Joins the clusters at rows `a < b`, averaging distances by leaf count.
fn merge(
    matrix: &mut DistanceMatrix,
    registry: &mut ClusterRegistry,
    tree: &mut PhyloTree,
    diagnostics: &mut Diagnostics,
    a: usize,
    b: usize,
) -> Result<(), ConstructError> {
    let live = matrix.size();
    let d_ab = matrix.distance(a, b);
    let height = 0.5 * d_ab;

    debug!("joining rows {a} and {b} (d = {d_ab:.6}, {live} live)");

    let vertex_a = registry.vertex_of(a);
    let vertex_b = registry.vertex_of(b);
    tree.set_branch_length(vertex_a, clamped(height - registry.height(a), diagnostics));
    tree.set_branch_length(vertex_b, clamped(height - registry.height(b), diagnostics));
    let merged = tree.add_internal([vertex_a, vertex_b], None);

    // Leaf-count weighted mean keeps d(u,k) the average leaf-to-leaf
    // distance between the joined cluster and cluster k
    let count_a = registry.leaf_count(a) as f64;
    let count_b = registry.leaf_count(b) as f64;
    let lambda = count_a / (count_a + count_b);
    let mu = 1.0 - lambda;

    for k in 0..live {
        if k == a || k == b {
            continue;
        }
        let d_mk = lambda * matrix.distance(a, k) + mu * matrix.distance(b, k);
        if !d_mk.is_finite() {
            return Err(ConstructError::NonFiniteDistance { row: k, col: a });
        }
        matrix.set_distance(a, k, d_mk);
    }

    let leaf_count = registry.leaf_count(a) + registry.leaf_count(b);
    registry.install_cluster(a, merged, 0.0, leaf_count, height);
    registry.swap_remove(b);
    matrix.remove_row_and_column(b);
    Ok(())
}

/// Clamps a computed branch length to zero, counting the clamp.
fn clamped(length: f64, diagnostics: &mut Diagnostics) -> BranchLength {
    if length < 0.0 {
        diagnostics.negative_branch_clamps += 1;
        BranchLength::new(0.0)
    } else {
        BranchLength::new(length)
    }
}

// =$========================================================================$=
// TESTS
// =$========================================================================$=
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_row_tie_selects_lowest_pair() {
        // Minima tied at (1, 2) and (0, 3); canonical order picks (0, 3)
        let data = vec![
            0.0, 2.0, 2.0, 1.0, //
            2.0, 0.0, 1.0, 2.0, //
            2.0, 1.0, 0.0, 2.0, //
            1.0, 2.0, 2.0, 0.0,
        ];
        let matrix = DistanceMatrix::from_flat(4, &data).unwrap();
        assert_eq!(closest_pair(&matrix), (0, 3));
    }
}
