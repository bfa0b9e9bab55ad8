//! Bookkeeping for live clusters during agglomeration.

use crate::model::vertex::VertexIndex;

// =#========================================================================#=
// CLUSTER REGISTRY
// =#========================================================================#=
/// Tracks which cluster occupies each live row of the
/// [DistanceMatrix](crate::matrix::DistanceMatrix), together with the
/// per-cluster quantities the selection criteria need.
///
/// Row `r` of the registry always describes the same cluster as row `r`
/// of the matrix; every mutation here mirrors a matrix mutation (write
/// the merged cluster over row `a`, swap-remove row `b`), so the two
/// structures shrink in lockstep.
///
/// Per live row:
/// - the [VertexIndex] of the cluster's vertex in the tree arena
/// - its *divergence*: the sum of distances to all other live clusters
///   (maintained incrementally by the Neighbor-Joining engine)
/// - its leaf count (UPGMA's weighting)
/// - its height above the leaves (UPGMA's branch lengths)
///
/// # Invariant
/// `live() == initial cluster count - merges()`.
#[derive(Debug)]
pub struct ClusterRegistry {
    /// Vertex of the cluster occupying each live row
    row_to_vertex: Vec<VertexIndex>,
    /// Divergence of each live row's cluster
    divergence: Vec<f64>,
    /// Number of leaves under each live row's cluster
    leaf_count: Vec<usize>,
    /// Height of each live row's cluster above the leaves
    height: Vec<f64>,
    /// Number of merges performed so far
    merges: usize,
}

impl ClusterRegistry {
    /// Creates a registry for the initial single-taxon clusters.
    ///
    /// # Arguments
    /// * `row_to_vertex` - Leaf vertex of each matrix row, in row order
    /// * `divergence` - Initial row totals of the distance matrix
    pub fn new(row_to_vertex: Vec<VertexIndex>, divergence: Vec<f64>) -> Self {
        let n = row_to_vertex.len();
        debug_assert_eq!(divergence.len(), n);
        ClusterRegistry {
            row_to_vertex,
            divergence,
            leaf_count: vec![1; n],
            height: vec![0.0; n],
            merges: 0,
        }
    }

    /// Returns the number of live clusters.
    pub fn live(&self) -> usize {
        self.row_to_vertex.len()
    }

    /// Returns the number of merges performed so far.
    pub fn merges(&self) -> usize {
        self.merges
    }

    /// Returns the tree vertex of the cluster at `row`.
    #[inline]
    pub fn vertex_of(&self, row: usize) -> VertexIndex {
        self.row_to_vertex[row]
    }

    /// Returns the divergence of the cluster at `row`.
    #[inline]
    pub fn divergence(&self, row: usize) -> f64 {
        self.divergence[row]
    }

    /// Returns the largest divergence among live clusters.
    pub fn max_divergence(&self) -> f64 {
        self.divergence.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }

    /// Adds `delta` to the divergence of the cluster at `row`.
    #[inline]
    pub fn add_to_divergence(&mut self, row: usize, delta: f64) {
        self.divergence[row] += delta;
    }

    /// Returns the leaf count of the cluster at `row`.
    #[inline]
    pub fn leaf_count(&self, row: usize) -> usize {
        self.leaf_count[row]
    }

    /// Returns the height of the cluster at `row`.
    #[inline]
    pub fn height(&self, row: usize) -> f64 {
        self.height[row]
    }

    /// Installs a freshly merged cluster in `row` (overwriting the
    /// cluster that was merged away there).
    pub fn install_cluster(
        &mut self,
        row: usize,
        vertex: VertexIndex,
        divergence: f64,
        leaf_count: usize,
        height: f64,
    ) {
        self.row_to_vertex[row] = vertex;
        self.divergence[row] = divergence;
        self.leaf_count[row] = leaf_count;
        self.height[row] = height;
    }

    /// Removes the cluster at `row` by moving the last row over it,
    /// mirroring
    /// [DistanceMatrix::remove_row_and_column](crate::matrix::DistanceMatrix::remove_row_and_column),
    /// and counts the merge.
    pub fn swap_remove(&mut self, row: usize) {
        self.row_to_vertex.swap_remove(row);
        self.divergence.swap_remove(row);
        self.leaf_count.swap_remove(row);
        self.height.swap_remove(row);
        self.merges += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_count_tracks_merges() {
        let mut registry = ClusterRegistry::new(vec![0, 1, 2, 3], vec![6.0, 10.0, 12.0, 14.0]);
        assert_eq!(registry.live(), 4);

        registry.install_cluster(0, 4, 9.0, 2, 0.5);
        registry.swap_remove(1);

        assert_eq!(registry.live(), 3);
        assert_eq!(registry.merges(), 1);
        assert_eq!(registry.vertex_of(0), 4);
        // Last row moved into the removed slot
        assert_eq!(registry.vertex_of(1), 3);
        assert_eq!(registry.leaf_count(0), 2);
    }
}
