//! Newick string writing with configurable numeric precision.

use crate::model::taxon_label_map::TaxonLabelMap;
use crate::model::tree::PhyloTree;
use crate::model::vertex::VertexIndex;
use std::fmt::Write;

/// Extra buffer in Newick string capacity estimate
const BUFFER_CHARS: usize = 10;

/// Structural characters per internal vertex: "(,)"
const INTERNAL_NODE_CHARS: usize = 3;

// =#========================================================================#=
// NEWICK WRITING
// =#========================================================================#=
/// Returns the Newick representation of a tree with closing semicolon.
///
/// Leaves are rendered as `label:length`, internal vertices as
/// `(child,child):length`, and the root as `(child,child[,child])` with
/// no length of its own. Children appear in the order they were attached
/// during clustering; this ordering is part of the output contract, not
/// an accident.
///
/// Branch lengths are written with exactly `precision` decimal digits
/// (`precision == 0` gives integer-formatted lengths). Negative
/// precision must be rejected upstream; see
/// [ConstructError::InvalidPrecision](crate::error::ConstructError::InvalidPrecision).
///
/// # Arguments
/// * `tree` - The finished tree (root set, branch lengths assigned)
/// * `labels` - Label map the tree's leaves point into
/// * `precision` - Number of decimal digits for branch lengths
///
/// # Panics
/// Panics if the tree is unfinished (no root, or a non-root vertex
/// without branch length).
pub fn to_newick(tree: &PhyloTree, labels: &TaxonLabelMap, precision: usize) -> String {
    let mut newick = String::with_capacity(estimate_newick_len(tree, labels, precision));
    build_newick(tree, labels, precision, tree.root_index(), &mut newick);
    newick.push(';');
    newick
}

/// Recursive helper appending the subtree rooted at `index`.
fn build_newick(
    tree: &PhyloTree,
    labels: &TaxonLabelMap,
    precision: usize,
    index: VertexIndex,
    newick: &mut String,
) {
    let vertex = &tree[index];

    if vertex.is_leaf() {
        let label = &labels[vertex.label_index().unwrap()];
        newick.push_str(&escape_label(label));
    } else {
        newick.push('(');
        for (i, &child) in vertex.children().iter().enumerate() {
            if i > 0 {
                newick.push(',');
            }
            build_newick(tree, labels, precision, child, newick);
        }
        newick.push(')');
    }

    if !vertex.is_root() {
        let length = *vertex.branch_length().unwrap();
        newick.push(':');
        // Writing to a String cannot fail
        let _ = write!(newick, "{length:.precision$}");
    }
}

/// Estimates the length of the Newick string for capacity pre-allocation.
fn estimate_newick_len(tree: &PhyloTree, labels: &TaxonLabelMap, precision: usize) -> usize {
    let num_internal = tree.num_internal() + 1; // +1 for root
    let structure = num_internal * INTERNAL_NODE_CHARS;

    let label_chars: usize = labels.labels().iter().map(|s| escape_label(s).len()).sum();

    // ":" + integer part estimate + "." + decimals
    let per_branch = 2 + 6 + precision;
    let branches = (tree.num_leaves_init() + num_internal - 1) * per_branch;

    structure + label_chars + branches + BUFFER_CHARS
}

// =#========================================================================#=
// LABEL ESCAPING
// =#========================================================================#=
/// Escapes a taxon label for Newick output.
///
/// Labels containing Newick structural characters, single quotes, or
/// control whitespace are wrapped in single quotes (internal quotes
/// doubled); otherwise spaces are replaced by underscores and the label
/// is emitted bare.
///
/// # Example
/// ```
/// # use njtree::newick::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("Pu[ke]ko"), "'Pu[ke]ko'");
/// assert_eq!(escape_label("Australasian Swamphen"), "Australasian_Swamphen");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    let needs_quoting = label.chars().any(|c| {
        matches!(
            c,
            '(' | ')' | '[' | ']' | ':' | ';' | ',' | '\'' | '\t' | '\n' | '\r'
        )
    });

    if needs_quoting {
        let mut escaped = String::with_capacity(label.len() + 2);
        escaped.push('\'');
        for c in label.chars() {
            escaped.push(c);
            if c == '\'' {
                escaped.push('\'');
            }
        }
        escaped.push('\'');
        escaped
    } else {
        label.replace(' ', "_")
    }
}
