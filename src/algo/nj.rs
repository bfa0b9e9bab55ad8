//! The Neighbor-Joining engine.
//!
//! Saitou & Nei's agglomerative algorithm over a distance matrix: while
//! more than three clusters are live, select the pair minimizing the
//! Q-criterion (see [scan](crate::algo::scan)), join it into a new
//! internal vertex with rate-corrected branch lengths, fold the pair's
//! rows into one, and repeat. The final three clusters are closed onto a
//! trifurcating unrooted root by solving the three-point system.
//!
//! Negative computed branch lengths and distances are a known artifact
//! of noisy input; they are clamped to zero and counted in
//! [Diagnostics], never treated as errors. Non-finite values abort the
//! run.

use crate::algo::Diagnostics;
use crate::algo::cluster::ClusterRegistry;
use crate::algo::scan::{ExhaustiveScan, Pair, PairScanner, RowBoundScan};
use crate::error::ConstructError;
use crate::matrix::DistanceMatrix;
use crate::model::tree::PhyloTree;
use crate::model::vertex::BranchLength;
use log::debug;

/// Runs Neighbor-Joining over `matrix`, which must have at least three
/// rows (validated by the caller).
///
/// # Arguments
/// * `matrix` - Validated distance matrix; consumed and mutated in place
/// * `pruned` - Select pairs with [RowBoundScan] ("NJ-R") instead of
///   [ExhaustiveScan] ("NJ"); the selected pairs are identical
///
/// # Errors
/// [ConstructError::NonFiniteDistance] if a distance or branch-length
/// update blows up.
pub fn run(mut matrix: DistanceMatrix, pruned: bool) -> Result<(PhyloTree, Diagnostics), ConstructError> {
    let n = matrix.size();
    debug_assert!(n >= 3);

    let mut tree = PhyloTree::new(n);
    let leaves: Vec<_> = (0..n).map(|taxon| tree.add_leaf(taxon)).collect();
    let mut registry = ClusterRegistry::new(leaves, matrix.row_totals());
    let mut diagnostics = Diagnostics::default();

    let mut scanner: Box<dyn PairScanner> = if pruned {
        Box::new(RowBoundScan::new(&matrix))
    } else {
        Box::new(ExhaustiveScan)
    };

    while matrix.size() > 3 {
        let pair = scanner.select(&matrix, &registry);
        merge(&mut matrix, &mut registry, &mut tree, &mut diagnostics, pair)?;
        scanner.after_merge(&matrix, pair.col, pair.row);
    }

    close(&matrix, &registry, &mut tree, &mut diagnostics)?;
    Ok((tree, diagnostics))
}

/// Joins the clusters at rows `pair.col` and `pair.row` into a new
/// internal vertex and folds their matrix rows into one.
fn merge(
    matrix: &mut DistanceMatrix,
    registry: &mut ClusterRegistry,
    tree: &mut PhyloTree,
    diagnostics: &mut Diagnostics,
    pair: Pair,
) -> Result<(), ConstructError> {
    let (a, b) = (pair.col, pair.row);
    let live = matrix.size();
    let d_ab = matrix.distance(a, b);
    let div_a = registry.divergence(a);
    let div_b = registry.divergence(b);

    debug!(
        "joining rows {a} and {b} (d = {d_ab:.6}, q = {:.6}, {live} live)",
        pair.q
    );

    // Rate-corrected branch lengths of the two children
    let denominator = (live - 2) as f64;
    let len_a = 0.5 * d_ab + (div_a - div_b) / (2.0 * denominator);
    let len_b = d_ab - len_a;
    if !len_a.is_finite() || !len_b.is_finite() {
        return Err(ConstructError::NonFiniteDistance { row: a, col: b });
    }

    let vertex_a = registry.vertex_of(a);
    let vertex_b = registry.vertex_of(b);
    tree.set_branch_length(vertex_a, clamped(len_a, diagnostics));
    tree.set_branch_length(vertex_b, clamped(len_b, diagnostics));
    let merged = tree.add_internal([vertex_a, vertex_b], None);

    // New distances from the merged cluster to every other live cluster,
    // written over row `a`; divergences updated incrementally.
    let mut divergence = 0.0;
    for k in 0..live {
        if k == a || k == b {
            continue;
        }
        let d_ak = matrix.distance(a, k);
        let d_bk = matrix.distance(b, k);
        let mut d_mk = 0.5 * (d_ak + d_bk - d_ab);
        if !d_mk.is_finite() {
            return Err(ConstructError::NonFiniteDistance { row: k, col: a });
        }
        if d_mk < 0.0 {
            d_mk = 0.0;
            diagnostics.negative_distance_clamps += 1;
        }
        registry.add_to_divergence(k, d_mk - d_ak - d_bk);
        divergence += d_mk;
        matrix.set_distance(a, k, d_mk);
    }

    let leaf_count = registry.leaf_count(a) + registry.leaf_count(b);
    registry.install_cluster(a, merged, divergence, leaf_count, 0.0);
    registry.swap_remove(b);
    matrix.remove_row_and_column(b);
    Ok(())
}

/// Connects the last three clusters to a trifurcating unrooted root,
/// solving the three-point system for their branch lengths.
fn close(
    matrix: &DistanceMatrix,
    registry: &ClusterRegistry,
    tree: &mut PhyloTree,
    diagnostics: &mut Diagnostics,
) -> Result<(), ConstructError> {
    debug_assert_eq!(matrix.size(), 3);
    let d01 = matrix.distance(0, 1);
    let d02 = matrix.distance(0, 2);
    let d12 = matrix.distance(1, 2);

    let lengths = [
        0.5 * (d01 + d02 - d12),
        0.5 * (d01 + d12 - d02),
        0.5 * (d02 + d12 - d01),
    ];

    let mut children = Vec::with_capacity(3);
    for (row, &length) in lengths.iter().enumerate() {
        if !length.is_finite() {
            return Err(ConstructError::NonFiniteDistance { row, col: row });
        }
        let vertex = registry.vertex_of(row);
        tree.set_branch_length(vertex, clamped(length, diagnostics));
        children.push(vertex);
    }
    tree.add_root(children);
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
