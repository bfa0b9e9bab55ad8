//! Vertex type for the arena tree representation.

use crate::model::taxon_label_map::LabelIndex;
use std::ops::Deref;

/// Index of a vertex in a tree (arena).
pub type VertexIndex = usize;

/// During construction, Internal and Leaf vertices might not have a parent yet.
const NO_PARENT_SET: VertexIndex = usize::MAX;

// =#========================================================================#=
// VERTEX
// =#========================================================================#=
/// A vertex (node) in a phylogenetic tree.
///
/// A vertex is one of:
/// - **Root**: no parent, no branch length; two children for rooted
///   trees (UPGMA) or three for the trifurcating root of an unrooted
///   tree (Neighbor-Joining)
/// - **Internal**: parent and exactly two children, optional branch length
/// - **Leaf**: parent, a [LabelIndex] into the shared
///   [TaxonLabelMap](crate::model::TaxonLabelMap), optional branch length
///
/// Branch lengths are optional because clustering assigns them when a
/// vertex is *merged into* its parent, not when it is created; a
/// finished tree has them on every non-root vertex.
#[derive(PartialEq, Debug, Clone)]
pub enum Vertex {
    /// Root of the tree (two or three children, no parent, no branch length)
    Root {
        /// Index of this vertex in the arena
        index: VertexIndex,
        /// Child indices, in creation order
        children: Vec<VertexIndex>,
    },
    /// Internal vertex (parent and two children, no label)
    Internal {
        /// Index of this vertex in the arena
        index: VertexIndex,
        /// Index of the parent vertex
        parent: VertexIndex,
        /// Indices of the two child vertices
        children: [VertexIndex; 2],
        /// Distance to parent (non-negative if present)
        branch_length: Option<BranchLength>,
    },
    /// Leaf vertex (parent and label, no children)
    Leaf {
        /// Index of this vertex in the arena
        index: VertexIndex,
        /// Index into the shared taxon label map
        label_index: LabelIndex,
        /// Index of the parent vertex
        parent: VertexIndex,
        /// Distance to parent (non-negative if present)
        branch_length: Option<BranchLength>,
    },
}

impl Vertex {
    /// Creates a new root vertex with the given children (two or three).
    pub fn new_root(index: VertexIndex, children: Vec<VertexIndex>) -> Self {
        debug_assert!(children.len() == 2 || children.len() == 3);
        Vertex::Root { index, children }
    }

    /// Creates a new internal vertex. The parent is set later, when this
    /// vertex is itself merged.
    pub fn new_internal(
        index: VertexIndex,
        children: [VertexIndex; 2],
        branch_length: Option<BranchLength>,
    ) -> Self {
        Vertex::Internal {
            index,
            parent: NO_PARENT_SET,
            children,
            branch_length,
        }
    }

    /// Creates a new leaf vertex for the taxon at `label_index`.
    pub fn new_leaf(index: VertexIndex, label_index: LabelIndex) -> Self {
        Vertex::Leaf {
            index,
            label_index,
            parent: NO_PARENT_SET,
            branch_length: None,
        }
    }

    /// Returns the index of this vertex.
    pub fn index(&self) -> VertexIndex {
        match self {
            Vertex::Root { index, .. } => *index,
            Vertex::Internal { index, .. } => *index,
            Vertex::Leaf { index, .. } => *index,
        }
    }

    /// Returns the branch length if this is a non-root vertex with one set.
    pub fn branch_length(&self) -> Option<BranchLength> {
        match self {
            Vertex::Root { .. } => None,
            Vertex::Internal { branch_length, .. } => *branch_length,
            Vertex::Leaf { branch_length, .. } => *branch_length,
        }
    }

    /// Returns whether this vertex has a [BranchLength] (roots count as
    /// complete without one).
    pub fn has_branch_length(&self) -> bool {
        match self {
            Vertex::Root { .. } => true,
            Vertex::Internal { branch_length, .. } => branch_length.is_some(),
            Vertex::Leaf { branch_length, .. } => branch_length.is_some(),
        }
    }

    /// Sets the branch length of a non-root vertex.
    ///
    /// # Panics
    /// Panics if called on the root.
    pub fn set_branch_length(&mut self, length: BranchLength) {
        match self {
            Vertex::Root { .. } => panic!("Cannot set branch length on root vertex"),
            Vertex::Internal { branch_length, .. } => *branch_length = Some(length),
            Vertex::Leaf { branch_length, .. } => *branch_length = Some(length),
        }
    }

    /// Returns the label index if this is a leaf, else `None`.
    pub fn label_index(&self) -> Option<LabelIndex> {
        match self {
            Vertex::Leaf { label_index, .. } => Some(*label_index),
            _ => None,
        }
    }

    /// Returns `true` if this vertex is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Vertex::Leaf { .. })
    }

    /// Returns `true` if this vertex is an internal (non-root) vertex.
    pub fn is_internal(&self) -> bool {
        matches!(self, Vertex::Internal { .. })
    }

    /// Returns `true` if this vertex is the root.
    pub fn is_root(&self) -> bool {
        matches!(self, Vertex::Root { .. })
    }

    /// Returns the children of this vertex, in creation order.
    /// Empty for leaves.
    pub fn children(&self) -> &[VertexIndex] {
        match self {
            Vertex::Root { children, .. } => children,
            Vertex::Internal { children, .. } => children,
            Vertex::Leaf { .. } => &[],
        }
    }

    /// Sets the parent of a non-root vertex.
    ///
    /// # Panics
    /// Panics if called on the root.
    pub fn set_parent(&mut self, parent: VertexIndex) {
        match self {
            Vertex::Root { .. } => panic!("Cannot set parent on root vertex"),
            Vertex::Internal { parent: p, .. } => *p = parent,
            Vertex::Leaf { parent: p, .. } => *p = parent,
        }
    }

    /// Returns the parent index of a non-root vertex, or `None` if this
    /// is the root or the parent has not been set yet.
    pub fn parent(&self) -> Option<VertexIndex> {
        match self {
            Vertex::Internal { parent, .. } | Vertex::Leaf { parent, .. } => {
                if *parent == NO_PARENT_SET {
                    None
                } else {
                    Some(*parent)
                }
            }
            Vertex::Root { .. } => None,
        }
    }

    /// Returns `true` if this vertex has a parent set.
    pub fn has_parent(&self) -> bool {
        match self {
            Vertex::Internal { parent, .. } | Vertex::Leaf { parent, .. } => {
                *parent != NO_PARENT_SET
            }
            Vertex::Root { .. } => false,
        }
    }
}

// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================#=
/// Branch length in a phylogenetic tree, enforced non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BranchLength(f64);

impl BranchLength {
    /// Creates a new branch length.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite. Clustering code
    /// clamps its computed lengths before constructing one.
    pub fn new(length: f64) -> Self {
        assert!(
            length >= 0.0,
            "Branch length must be non-negative, got {}",
            length
        );
        assert!(
            length.is_finite(),
            "Branch length must be finite, got {}",
            length
        );
        BranchLength(length)
    }
}

impl Deref for BranchLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}
