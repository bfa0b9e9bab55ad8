//! Arena-based phylogenetic tree representation.
//!
//! [PhyloTree] stores all vertices in a contiguous vector and references
//! them by [VertexIndex], avoiding reference cycles and giving traversal
//! good cache locality. Clustering builds a tree bottom-up: leaves
//! first, then one internal vertex per merge, finally the root.
//!
//! The root is trifurcating for unrooted trees (Neighbor-Joining) and
//! binary for rooted trees (UPGMA); everything else is strictly binary.

use crate::model::taxon_label_map::LabelIndex;
use crate::model::vertex::{BranchLength, Vertex, VertexIndex};

/// Float comparison tolerance for ultrametricity checks
const EPSILON: f64 = 1e-7;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: VertexIndex = usize::MAX;

// =#========================================================================#=
// PHYLO TREE
// =#========================================================================#=
/// A phylogenetic tree built over [Vertex] values in an arena.
///
/// # Structure
/// - All vertices (root, internal, leaves) live in the arena; the root
///   index is maintained separately.
/// - Leaves reference their taxon label by [LabelIndex]; the tree does
///   not own label strings (see
///   [TaxonLabelMap](crate::model::TaxonLabelMap)).
/// - Branch lengths are optional during construction; a finished tree
///   has one on every non-root vertex.
///
/// # Invariants (finished tree)
/// - exactly `num_leaves_init` leaves
/// - `2n - 2` vertices for an unrooted (trifurcating-root) tree,
///   `2n - 1` for a rooted one
///
/// Validity can be checked with [`PhyloTree::is_valid`].
#[derive(Debug, Clone)]
pub struct PhyloTree {
    /// Number of leaves this tree was built for
    num_leaves_init: usize,
    /// Vertices of this tree (arena pattern)
    vertices: Vec<Vertex>,
    /// Index of the root
    root_index: VertexIndex,
}

impl PhyloTree {
    /// Creates an empty tree with capacity for `num_leaves` leaves.
    ///
    /// # Arguments
    /// * `num_leaves` - leaf count of the finished tree; must be positive
    pub fn new(num_leaves: usize) -> Self {
        assert!(num_leaves > 0);
        let capacity = 2 * num_leaves - 1;
        PhyloTree {
            num_leaves_init: num_leaves,
            root_index: NO_ROOT_SET_INDEX,
            vertices: Vec::with_capacity(capacity),
        }
    }

    /// Adds a leaf for the taxon at `label_index`, returning its index.
    /// The branch length is assigned later, when the leaf is merged.
    pub fn add_leaf(&mut self, label_index: LabelIndex) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_leaf(index, label_index));
        index
    }

    /// Adds an internal vertex joining two children, returning its index.
    ///
    /// # Arguments
    /// * `children` - the two child indices, in merge order
    /// * `branch_length` - length of the incoming edge, if already known
    pub fn add_internal(
        &mut self,
        children: [VertexIndex; 2],
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices
            .push(Vertex::new_internal(index, children, branch_length));
        self.vertices[children[0]].set_parent(index);
        self.vertices[children[1]].set_parent(index);
        index
    }

    /// Adds the root joining the final clusters (two for rooted trees,
    /// three for unrooted), returning its index.
    pub fn add_root(&mut self, children: Vec<VertexIndex>) -> VertexIndex {
        let index = self.vertices.len();
        for &child in &children {
            self.vertices[child].set_parent(index);
        }
        self.vertices.push(Vertex::new_root(index, children));
        self.root_index = index;
        index
    }

    /// Sets the branch length of the vertex at `index`.
    ///
    /// # Panics
    /// Panics if `index` is the root or out of bounds.
    pub fn set_branch_length(&mut self, index: VertexIndex, length: BranchLength) {
        self.vertices[index].set_branch_length(length);
    }

    /// Returns whether the root has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index != NO_ROOT_SET_INDEX
    }

    /// Returns a reference to the root vertex.
    ///
    /// # Panics
    /// Panics if the root has not been set yet.
    pub fn root(&self) -> &Vertex {
        &self.vertices[self.root_index]
    }

    /// Returns the index of the root.
    pub fn root_index(&self) -> VertexIndex {
        self.root_index
    }

    /// Returns a reference to the vertex at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self.vertices[index]
    }

    /// Returns the number of leaves this tree was built for.
    pub fn num_leaves_init(&self) -> usize {
        self.num_leaves_init
    }

    /// Returns the number of leaf vertices.
    pub fn num_leaves(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_leaf()).count()
    }

    /// Returns the number of internal (non-root) vertices.
    pub fn num_internal(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_internal()).count()
    }

    /// Returns the number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the sum of all branch lengths.
    pub fn total_branch_length(&self) -> f64 {
        self.vertices
            .iter()
            .filter_map(|v| v.branch_length())
            .map(|bl| *bl)
            .sum()
    }

    /// Checks if all non-root vertices have branch lengths set.
    pub fn vertices_have_branch_lengths(&self) -> bool {
        self.vertices
            .iter()
            .all(|v| v.is_root() || v.has_branch_length())
    }

    /// Checks if the tree is ultrametric (all leaves equidistant from
    /// the root, within floating tolerance).
    ///
    /// # Panics
    /// Panics if not all non-root vertices have branch lengths, which
    /// can be checked first with
    /// [vertices_have_branch_lengths](Self::vertices_have_branch_lengths).
    pub fn is_ultrametric(&self) -> bool {
        // Distance from each vertex down to its leaves, including its
        // own incoming branch
        let mut below = vec![0.0; self.num_vertices()];

        for vertex in self.post_order_iter() {
            if vertex.is_leaf() {
                below[vertex.index()] = *vertex.branch_length().unwrap();
                continue;
            }

            let children = vertex.children();
            let first = below[children[0]];
            for &child in &children[1..] {
                if (below[child] - first).abs() > EPSILON {
                    return false;
                }
            }
            if !vertex.is_root() {
                below[vertex.index()] = first + *vertex.branch_length().unwrap();
            }
        }

        true
    }

    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - root is set, in bounds, and is a Root vertex
    /// - every vertex index matches its arena position
    /// - exactly one root; leaf count matches `num_leaves_init`
    /// - children point back to their parent, parents list their children
    /// - vertex count matches `2n - 2` (trifurcating root) or `2n - 1`
    ///   (binary root)
    pub fn is_valid(&self) -> bool {
        if self.root_index == NO_ROOT_SET_INDEX || self.root_index >= self.vertices.len() {
            return false;
        }
        if !self.vertices[self.root_index].is_root() {
            return false;
        }

        let mut leaf_count = 0;
        let mut found_root = false;

        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.index() != index {
                return false;
            }

            if vertex.is_root() {
                if found_root {
                    return false;
                }
                found_root = true;
                if vertex.has_parent() {
                    return false;
                }
            } else {
                match vertex.parent() {
                    None => return false,
                    Some(parent_index) => {
                        if parent_index >= self.vertices.len() {
                            return false;
                        }
                        let siblings = self.vertices[parent_index].children();
                        if !siblings.contains(&index) {
                            return false;
                        }
                    }
                }
            }

            if vertex.is_leaf() {
                leaf_count += 1;
                let label = vertex.label_index();
                if label.is_none_or(|l| l >= self.num_leaves_init) {
                    return false;
                }
            }

            for &child in vertex.children() {
                if child >= self.vertices.len() {
                    return false;
                }
                if self.vertices[child].parent() != Some(index) {
                    return false;
                }
            }
        }

        if leaf_count != self.num_leaves_init {
            return false;
        }

        let n = self.num_leaves_init;
        let expected = match self.vertices[self.root_index].children().len() {
            3 => 2 * n - 2,
            2 => 2 * n - 1,
            _ => return false,
        };
        self.vertices.len() == expected
    }

    /// Computes all pairwise patristic distances (sums of branch lengths
    /// along leaf-to-leaf paths), indexed by [LabelIndex].
    ///
    /// # Panics
    /// Panics if the tree is unfinished (no root, or missing branch
    /// lengths on non-root vertices).
    pub fn patristic_distances(&self) -> Vec<Vec<f64>> {
        let n = self.num_leaves_init;
        let mut result = vec![vec![0.0; n]; n];

        // Depth of every vertex from the root, in branch-length terms
        let mut depth = vec![0.0; self.num_vertices()];
        for vertex in self.pre_order_iter() {
            if !vertex.is_root() {
                let parent = vertex.parent().unwrap();
                depth[vertex.index()] = depth[parent] + *vertex.branch_length().unwrap();
            }
        }

        // Leaves below each vertex; two leaves in different child
        // subtrees of v have v as their lowest common ancestor.
        let mut leaves_below: Vec<Vec<LabelIndex>> = vec![Vec::new(); self.num_vertices()];
        let mut leaf_depth = vec![0.0; n];

        for vertex in self.post_order_iter() {
            let index = vertex.index();
            if let Some(label) = vertex.label_index() {
                leaf_depth[label] = depth[index];
                leaves_below[index].push(label);
                continue;
            }

            let children = vertex.children().to_vec();
            for (i, &left) in children.iter().enumerate() {
                for &right in &children[i + 1..] {
                    for &a in &leaves_below[left] {
                        for &b in &leaves_below[right] {
                            let d = leaf_depth[a] + leaf_depth[b] - 2.0 * depth[index];
                            result[a][b] = d;
                            result[b][a] = d;
                        }
                    }
                }
            }

            let mut merged = Vec::new();
            for &child in &children {
                merged.append(&mut leaves_below[child]);
            }
            leaves_below[index] = merged;
        }

        result
    }
}

impl std::ops::Index<VertexIndex> for PhyloTree {
    type Output = Vertex;

    fn index(&self, index: VertexIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

// =$========================================================================$=
// ITERATORS
// =$========================================================================$=
impl PhyloTree {
    /// Returns an iterator over the tree in post-order (children before
    /// parents). Useful for aggregating data from leaves upward.
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before
    /// children). Useful for propagating data from the root down.
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }
}

/// Iterator for post-order traversal (children before parents).
pub struct PostOrderIter<'a> {
    tree: &'a PhyloTree,
    stack: Vec<(VertexIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a PhyloTree) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push((tree.root_index, false));
        }
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let vertex = &self.tree[index];

            if children_visited || vertex.is_leaf() {
                return Some(vertex);
            }

            self.stack.push((index, true));
            // Push children in reverse so the first child is processed first
            for &child in vertex.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
pub struct PreOrderIter<'a> {
    tree: &'a PhyloTree,
    stack: Vec<VertexIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a PhyloTree) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push(tree.root_index);
        }
        PreOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let vertex = &self.tree[index];

        for &child in vertex.children().iter().rev() {
            self.stack.push(child);
        }

        Some(vertex)
    }
}
