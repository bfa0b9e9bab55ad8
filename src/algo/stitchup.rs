//! The Family Stitch-up engine.
//!
//! Stitch-up lets the leaf distances alone decide the topology: it keeps
//! a "caterpillar chain" of interior nodes per taxon, repeatedly takes
//! the globally cheapest edge between taxa in different components, and
//! staples the two chain ends together through a fresh interior node on
//! each side. Once all taxa are connected, interior nodes of degree two
//! (stitches that did not pan out) are spliced out, their edge lengths
//! summed, leaving an unrooted binary tree.
//!
//! Unlike Neighbor-Joining, selection never re-derives distances, so no
//! rate correction and no negative intermediate values arise; branch
//! lengths here are crude by construction and meant for later
//! refinement. Equal-length edges are taken in canonically lowest
//! `(col, row)` order, so output is deterministic like the other
//! engines.

use crate::algo::Diagnostics;
use crate::error::ConstructError;
use crate::matrix::DistanceMatrix;
use crate::model::tree::PhyloTree;
use crate::model::vertex::{BranchLength, VertexIndex};
use log::debug;

/// Fraction of the pair distance assigned to the edge between the two
/// fresh interior nodes.
const STAPLE_ARCH: f64 = 1.0 / 3.0;

/// Fraction of the remaining distance assigned to each chain-end leg.
const STAPLE_LEG: f64 = 0.5 * (1.0 - STAPLE_ARCH);

/// Runs Family Stitch-up over `matrix`, which must have at least three
/// rows (validated by the caller). The matrix is only read; stitching
/// works on the original leaf distances throughout.
///
/// # Errors
/// [ConstructError::NonFiniteDistance] if splicing accumulates an edge
/// length past the finite range.
pub fn run(matrix: DistanceMatrix) -> Result<(PhyloTree, Diagnostics), ConstructError> {
    let n = matrix.size();
    debug_assert!(n >= 3);

    // Cheapest-first over all taxon pairs, ties in canonical order
    let mut edges: Vec<(usize, usize, f64)> = Vec::with_capacity(n * (n - 1) / 2);
    for row in 1..n {
        for col in 0..row {
            edges.push((col, row, matrix.distance(row, col)));
        }
    }
    edges.sort_by(|a, b| a.2.total_cmp(&b.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));

    let mut graph = StitchupGraph::new(n);
    let mut components = DisjointSets::new(n);

    let mut joins = 0;
    for &(a, b, length) in &edges {
        if !components.union(a, b) {
            continue;
        }
        debug!("stapling taxa {a} and {b} (d = {length:.6})");
        graph.staple(a, b, length);
        joins += 1;
        if joins == n - 1 {
            break;
        }
    }
    debug_assert_eq!(joins, n - 1);

    graph.into_tree(n)
}

// =#========================================================================#=
// STITCH-UP GRAPH
// =#========================================================================#=
/// Undirected edge-weighted graph under construction: taxa first, then
/// two interior nodes per staple.
struct StitchupGraph {
    /// Adjacency list per node, `(neighbor, edge length)` in insertion order
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Current chain-end node of each taxon
    chain_end: Vec<usize>,
    /// Length of the last leg added to each taxon's chain
    last_leg: Vec<f64>,
}

impl StitchupGraph {
    fn new(n: usize) -> Self {
        StitchupGraph {
            adjacency: (0..n).map(|_| Vec::new()).collect(),
            chain_end: (0..n).collect(),
            last_leg: vec![0.0; n],
        }
    }

    /// Connects the chains of taxa `a` and `b` through two fresh
    /// interior nodes. Leg lengths discount the previous leg, so legs
    /// shorten as a chain grows; edges are popped cheapest-first, which
    /// keeps every leg non-negative.
    fn staple(&mut self, a: usize, b: usize, length: f64) {
        let interior_a = self.extend_chain(a, length);
        let interior_b = self.extend_chain(b, length);
        self.link(interior_a, interior_b, length * STAPLE_ARCH);
    }

    fn extend_chain(&mut self, taxon: usize, length: f64) -> usize {
        let interior = self.adjacency.len();
        self.adjacency.push(Vec::new());
        let leg = (length - self.last_leg[taxon]) * STAPLE_LEG;
        self.link(self.chain_end[taxon], interior, leg);
        self.chain_end[taxon] = interior;
        self.last_leg[taxon] = leg;
        interior
    }

    fn link(&mut self, node_a: usize, node_b: usize, length: f64) {
        self.adjacency[node_a].push((node_b, length));
        self.adjacency[node_b].push((node_a, length));
    }

    /// Splices out degree-2 interior nodes (summing their edge lengths)
    /// while materializing the remaining topology as a [PhyloTree],
    /// rooted at the highest-numbered branching node.
    fn into_tree(self, n: usize) -> Result<(PhyloTree, Diagnostics), ConstructError> {
        let root_node = (n..self.adjacency.len())
            .rev()
            .find(|&node| self.adjacency[node].len() == 3)
            .expect("stitchup graph has a branching interior node");

        let mut tree = PhyloTree::new(n);
        for taxon in 0..n {
            tree.add_leaf(taxon);
        }
        let mut diagnostics = Diagnostics::default();

        let mut children = Vec::with_capacity(3);
        for &(neighbor, length) in &self.adjacency[root_node] {
            children.push(self.descend(neighbor, root_node, length, &mut tree, &mut diagnostics)?);
        }
        tree.add_root(children);

        Ok((tree, diagnostics))
    }

    /// Builds the subtree entered through the edge `parent -> node` of
    /// accumulated length `carried`, walking through degree-2 nodes.
    fn descend(
        &self,
        mut node: usize,
        mut parent: usize,
        mut carried: f64,
        tree: &mut PhyloTree,
        diagnostics: &mut Diagnostics,
    ) -> Result<VertexIndex, ConstructError> {
        let n = tree.num_leaves_init();

        while node >= n && self.adjacency[node].len() == 2 {
            let &(next, length) = self.adjacency[node]
                .iter()
                .find(|&&(neighbor, _)| neighbor != parent)
                .expect("degree-2 node has a second neighbor");
            carried += length;
            parent = node;
            node = next;
        }
        if !carried.is_finite() {
            let row = if node < n { node } else { 0 };
            return Err(ConstructError::NonFiniteDistance { row, col: 0 });
        }
        let branch = clamped(carried, diagnostics);

        if node < n {
            tree.set_branch_length(node, branch);
            return Ok(node);
        }

        let mut children = [0; 2];
        let mut next_child = 0;
        for &(neighbor, length) in &self.adjacency[node] {
            if neighbor == parent {
                continue;
            }
            children[next_child] = self.descend(neighbor, node, length, tree, diagnostics)?;
            next_child += 1;
        }
        debug_assert_eq!(next_child, 2);
        Ok(tree.add_internal(children, Some(branch)))
    }
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

// =#========================================================================#=
// DISJOINT SETS
// =#========================================================================#=
/// Union-find over taxa, tracking which are already connected.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        DisjointSets {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the sets of `a` and `b` (smaller into larger), returning
    /// `false` if they were already connected.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut root_a, mut root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return false;
        }
        if self.size[root_a] < self.size[root_b] {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b] = root_a;
        self.size[root_a] += self.size[root_b];
        true
    }
}

// =$========================================================================$=
// TESTS
// =$========================================================================$=
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_sets_track_connectivity() {
        let mut sets = DisjointSets::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(!sets.union(1, 0));
        assert!(sets.union(0, 3));
        assert!(!sets.union(2, 1));
    }

    #[test]
    fn unit_triangle_staples_in_canonical_order() {
        let data = vec![0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0];
        let matrix = DistanceMatrix::from_flat(3, &data).unwrap();
        let (tree, diagnostics) = run(matrix).unwrap();

        assert!(tree.is_valid());
        assert!(diagnostics.is_clean());
        assert_eq!(tree.root().children().len(), 3);

        // First staple (0, 1) gives both legs d/3; the second staple
        // (0, 2) discounts taxon 0's previous leg.
        let distances = tree.patristic_distances();
        assert!((distances[0][1] - 1.0).abs() < 1e-12);
        let leg_0_second = (1.0 - 1.0 / 3.0) * STAPLE_LEG;
        let expected_0_2 = 1.0 / 3.0 + leg_0_second + STAPLE_ARCH + 1.0 / 3.0;
        assert!((distances[0][2] - expected_0_2).abs() < 1e-12);
    }
}
