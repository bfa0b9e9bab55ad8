//! njtree constructs phylogenetic trees from pairwise distance matrices
//! and renders them as Newick strings.
//!
//! Core functionality:
//! - Algorithms: classic Neighbor-Joining (`"NJ"`), its rapid
//!   candidate-pruned variant (`"NJ-R"`, same trees, faster selection),
//!   Family Stitch-up (`"STITCH"`, cheapest-edge stapling), and UPGMA
//!   (`"UPGMA"`, rooted ultrametric output). See [AlgorithmRegistry]
//!   for the table.
//! - Input: taxon labels plus a symmetric zero-diagonal distance matrix,
//!   supplied flat (row-major `n * n` slice) or as nested rows; both are
//!   validated up front (shape, negative/non-finite entries, diagonal
//!   and symmetry tolerance).
//! - Output: a Newick string with branch lengths at configurable decimal
//!   precision, or the full [TreeResult] with the arena [PhyloTree],
//!   label map, and clamp [Diagnostics].
//! - The pair scan parallelizes across matrix rows via rayon; pass
//!   [`ConstructOptions::threads`] to size the pool per call.
//!
//! Determinism: given identical input, every algorithm produces
//! byte-identical output. Equal-scoring candidate pairs are broken
//! toward the canonically lowest row pair, and `NJ` and `NJ-R` share
//! that tie-break exactly.
//!
//! # Usage patterns
//! 1. [construct_tree] for the common case (default options).
//! 2. [`AlgorithmRegistry::construct`] with [ConstructOptions] for
//!    thread count, validation tolerance, or access to the tree and
//!    diagnostics.
//!
//! ## Example
//! ```
//! use njtree::{DistanceInput, construct_tree};
//!
//! let labels = ["cat", "dog", "rat"];
//! let distances = [0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0];
//! let newick = construct_tree("NJ-R", &labels, DistanceInput::Flat(&distances), 1)?;
//! assert_eq!(newick, "(cat:0.5,dog:0.5,rat:0.5);");
//! # Ok::<(), njtree::ConstructError>(())
//! ```

pub mod algo;
pub mod error;
pub mod matrix;
pub mod model;
pub mod newick;

pub use algo::{AlgorithmInfo, AlgorithmRegistry, ConstructOptions, Diagnostics, TreeResult};
pub use error::{ConstructError, DistanceFault};
pub use matrix::{DistanceInput, DistanceMatrix};
pub use model::{PhyloTree, TaxonLabelMap};

// ============================================================================
// Quick API
// ============================================================================
/// Constructs a tree with default options and returns its Newick string.
///
/// # Arguments
/// * `algorithm` - Registered algorithm name (`"NJ"`, `"NJ-R"`,
///   `"STITCH"`, `"UPGMA"`; case-insensitive)
/// * `taxon_labels` - One label per taxon, in matrix-row order; at
///   least three, all distinct
/// * `distances` - The pairwise distance matrix, flat or nested
/// * `precision` - Decimal digits for branch lengths (`0` for
///   integer-formatted lengths)
///
/// # Errors
/// All input validation happens before any algorithmic work; see
/// [ConstructError] for the taxonomy.
///
/// # Example
/// ```
/// use njtree::{DistanceInput, construct_tree};
///
/// let labels = ["cat", "dog", "rat"];
/// let rows = vec![
///     vec![0.0, 1.0, 1.0],
///     vec![1.0, 0.0, 1.0],
///     vec![1.0, 1.0, 0.0],
/// ];
/// let newick = construct_tree("NJ", &labels, DistanceInput::Rows(&rows), 1)?;
/// assert_eq!(newick, "(cat:0.5,dog:0.5,rat:0.5);");
/// # Ok::<(), njtree::ConstructError>(())
/// ```
pub fn construct_tree<S: AsRef<str>>(
    algorithm: &str,
    taxon_labels: &[S],
    distances: DistanceInput<'_>,
    precision: i32,
) -> Result<String, ConstructError> {
    let options = ConstructOptions {
        precision,
        ..ConstructOptions::default()
    };
    let registry = AlgorithmRegistry::with_default_algorithms();
    let result = registry.construct(algorithm, taxon_labels, distances, &options)?;
    Ok(result.newick)
}

/// Lists the registered algorithm identifiers.
///
/// # Arguments
/// * `verbose` - Return `NAME: description` lines instead of short codes
///
/// # Example
/// ```
/// assert_eq!(njtree::algorithm_names(false), ["NJ", "NJ-R", "STITCH", "UPGMA"]);
/// ```
pub fn algorithm_names(verbose: bool) -> Vec<String> {
    AlgorithmRegistry::with_default_algorithms().names(verbose)
}
