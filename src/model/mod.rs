//! Data model for phylogenetic trees.
//!
//! # Tree representation
//! Trees are represented by [PhyloTree], which uses the arena pattern to
//! store [Vertex] nodes. Each vertex is a `Root`, `Internal`, or `Leaf`,
//! referenced by [VertexIndex]. The root is binary for rooted trees
//! (UPGMA output) and trifurcating for unrooted trees (Neighbor-Joining
//! output); all other internal vertices are binary.
//!
//! # Labels
//! Leaves store a [LabelIndex] into a shared [TaxonLabelMap] built once
//! from the caller's taxon list, so label index `i` and initial matrix
//! row `i` denote the same taxon.
//!
//! # Building
//! Clustering engines build trees bottom-up: all leaves first, then one
//! internal vertex per merge (branch lengths assigned to the vertices
//! being merged), and finally the root joining the last clusters.

pub mod taxon_label_map;
pub mod tree;
pub mod vertex;

pub use taxon_label_map::LabelIndex;
pub use taxon_label_map::TaxonLabelMap;
pub use tree::PhyloTree;
pub use vertex::BranchLength;
pub use vertex::Vertex;
pub use vertex::VertexIndex;
