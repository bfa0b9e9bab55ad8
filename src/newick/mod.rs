//! Newick format writing for phylogenetic trees.
//!
//! # Format
//! The Newick format produced here has the following simple grammar:
//! * `tree ::= vertex ';'`
//! * `vertex ::= leaf | internal_vertex`
//! * `internal_vertex ::= '(' vertex (',' vertex)+ ')' [branch_length]`
//! * `leaf ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! The root carries no branch length; an unrooted tree's root has three
//! children, all other internal vertices have two. Branch lengths are
//! fixed-point with a configurable number of decimal digits.

pub mod writer;

pub use writer::escape_label;
pub use writer::to_newick;
