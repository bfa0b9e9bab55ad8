//! Algorithm registry and tree-construction orchestration.
//!
//! The registry is an explicit immutable table built once (at startup or
//! per call, it is three static entries) and passed by reference; there
//! is no ambient global state. Each construction call owns its own
//! matrix, registry-of-clusters, and tree, so concurrent calls never
//! share mutable state.
//!
//! Registered algorithms:
//!
//! | Name     | Strategy |
//! |----------|----------|
//! | `NJ`     | Neighbor-Joining, exhaustive pair scan |
//! | `NJ-R`   | Neighbor-Joining, row-bound pruned scan (same trees as `NJ`) |
//! | `STITCH` | Family Stitch-up, cheapest-edge stapling |
//! | `UPGMA`  | Unweighted pair group method, rooted output |

pub mod cluster;
pub mod nj;
pub mod scan;
pub mod stitchup;
pub mod upgma;

pub use cluster::ClusterRegistry;
pub use scan::{ExhaustiveScan, PairScanner, RowBoundScan};

use crate::error::ConstructError;
use crate::matrix::{DEFAULT_TOLERANCE, DistanceInput, DistanceMatrix};
use crate::model::taxon_label_map::TaxonLabelMap;
use crate::model::tree::PhyloTree;
use crate::newick;
use log::{info, warn};
use std::time::Instant;

// =#========================================================================#=
// DIAGNOSTICS
// =#========================================================================#=
/// Counters for the numeric repairs applied during a run.
///
/// Negative computed branch lengths and distances are a known artifact
/// of noisy input distances; they are clamped to zero and counted here
/// rather than failing the run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    /// Computed branch lengths clamped up to zero
    pub negative_branch_clamps: usize,
    /// Computed cluster distances clamped up to zero
    pub negative_distance_clamps: usize,
}

impl Diagnostics {
    /// Returns `true` if no repairs were applied.
    pub fn is_clean(&self) -> bool {
        self.negative_branch_clamps == 0 && self.negative_distance_clamps == 0
    }
}

// =#========================================================================#=
// ALGORITHM REGISTRY
// =#========================================================================#=
/// Which engine an algorithm name maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlgorithmKind {
    /// Neighbor-Joining; `pruned` selects the rapid "-R" scan
    NeighborJoining { pruned: bool },
    /// Family Stitch-up over the raw leaf distances
    Stitchup,
    /// UPGMA with leaf-count weighted averaging
    Upgma,
}

/// A registered algorithm: short code, descriptive name, engine.
#[derive(Debug, Clone)]
pub struct AlgorithmInfo {
    /// Short code used for lookup (e.g. "NJ-R")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    kind: AlgorithmKind,
}

/// Immutable table of the registered algorithm variants.
///
/// # Example
/// ```
/// use njtree::AlgorithmRegistry;
///
/// let registry = AlgorithmRegistry::with_default_algorithms();
/// assert_eq!(registry.names(false), ["NJ", "NJ-R", "STITCH", "UPGMA"]);
/// assert!(registry.find("nj-r").is_some()); // lookup ignores case
/// ```
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    algorithms: Vec<AlgorithmInfo>,
}

impl AlgorithmRegistry {
    /// Builds the default registry: NJ, NJ-R, STITCH, UPGMA.
    pub fn with_default_algorithms() -> Self {
        AlgorithmRegistry {
            algorithms: vec![
                AlgorithmInfo {
                    name: "NJ",
                    description: "Neighbor-Joining (Saitou, Nei 1987)",
                    kind: AlgorithmKind::NeighborJoining { pruned: false },
                },
                AlgorithmInfo {
                    name: "NJ-R",
                    description: "Neighbor-Joining (rapid, row-bound candidate pruning)",
                    kind: AlgorithmKind::NeighborJoining { pruned: true },
                },
                AlgorithmInfo {
                    name: "STITCH",
                    description: "Family Stitch-up (Lowest Cost)",
                    kind: AlgorithmKind::Stitchup,
                },
                AlgorithmInfo {
                    name: "UPGMA",
                    description: "Unweighted pair group method with arithmetic mean (Sokal, Michener 1958)",
                    kind: AlgorithmKind::Upgma,
                },
            ],
        }
    }

    /// Looks up an algorithm by name (ASCII case-insensitive).
    pub fn find(&self, name: &str) -> Option<&AlgorithmInfo> {
        self.algorithms
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(name))
    }

    /// Returns the registered algorithm identifiers.
    ///
    /// # Arguments
    /// * `verbose` - Return `NAME: description` instead of short codes
    pub fn names(&self, verbose: bool) -> Vec<String> {
        self.algorithms
            .iter()
            .map(|info| {
                if verbose {
                    format!("{}: {}", info.name, info.description)
                } else {
                    info.name.to_string()
                }
            })
            .collect()
    }

    /// Constructs a tree and returns the full result (tree, labels,
    /// diagnostics, Newick string).
    ///
    /// This is the configurable entry point behind
    /// [construct_tree](crate::construct_tree); see there for the
    /// argument contract.
    pub fn construct<S: AsRef<str>>(
        &self,
        algorithm: &str,
        taxon_labels: &[S],
        distances: DistanceInput<'_>,
        options: &ConstructOptions,
    ) -> Result<TreeResult, ConstructError> {
        // Validate everything before any algorithmic work
        let info = self
            .find(algorithm)
            .ok_or_else(|| ConstructError::UnknownAlgorithm(algorithm.to_string()))?;

        let n = taxon_labels.len();
        if n < 3 {
            return Err(ConstructError::TooFewTaxa(n));
        }

        let labels = TaxonLabelMap::from_labels(taxon_labels).map_err(ConstructError::DuplicateLabel)?;

        if options.precision < 0 {
            return Err(ConstructError::InvalidPrecision(options.precision));
        }
        let precision = options.precision as usize;

        let matrix = distances.into_matrix(n, options.tolerance)?;

        info!("Constructing {} tree over {n} taxa", info.name);
        let started = Instant::now();
        let (tree, diagnostics) = run_engine(info.kind, matrix, options.threads)?;
        info!(
            "Constructed {} tree in {:.3}s",
            info.name,
            started.elapsed().as_secs_f64()
        );

        if !diagnostics.is_clean() {
            warn!(
                "Clamped {} negative branch lengths and {} negative distances to zero",
                diagnostics.negative_branch_clamps, diagnostics.negative_distance_clamps
            );
        }

        let newick = newick::to_newick(&tree, &labels, precision);
        Ok(TreeResult {
            newick,
            tree,
            labels,
            diagnostics,
        })
    }
}

/// Dispatches to the selected engine, on a dedicated rayon pool when a
/// thread count was requested.
fn run_engine(
    kind: AlgorithmKind,
    matrix: DistanceMatrix,
    threads: usize,
) -> Result<(PhyloTree, Diagnostics), ConstructError> {
    let run = move || match kind {
        AlgorithmKind::NeighborJoining { pruned } => nj::run(matrix, pruned),
        AlgorithmKind::Stitchup => stitchup::run(matrix),
        AlgorithmKind::Upgma => upgma::run(matrix),
    };

    if threads == 0 {
        return run();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(run),
        Err(error) => {
            // Thread-count preferences are not worth failing a run over
            warn!("Could not build a {threads}-thread pool ({error}); using the global pool");
            run()
        }
    }
}

// =#========================================================================#=
// OPTIONS & RESULT
// =#========================================================================#=
/// Options for a construction run.
#[derive(Debug, Clone)]
pub struct ConstructOptions {
    /// Decimal digits for branch lengths in the Newick output;
    /// negative values are rejected with
    /// [InvalidPrecision](ConstructError::InvalidPrecision)
    pub precision: i32,
    /// Worker threads for the pair scan; `0` uses the global rayon pool
    pub threads: usize,
    /// Tolerance for diagonal and symmetry validation
    pub tolerance: f64,
}

impl Default for ConstructOptions {
    fn default() -> Self {
        ConstructOptions {
            precision: 6,
            threads: 0,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Everything a construction run produces.
#[derive(Debug)]
pub struct TreeResult {
    /// The tree serialized as a Newick string
    pub newick: String,
    /// The constructed tree
    pub tree: PhyloTree,
    /// Label map the tree's leaves point into
    pub labels: TaxonLabelMap,
    /// Numeric-repair counters for the run
    pub diagnostics: Diagnostics,
}
