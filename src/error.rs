//! Error types for distance-matrix validation and tree construction.

use std::error::Error;
use std::fmt;

// =#========================================================================#=
// DISTANCE FAULT
// =#========================================================================#=
/// What exactly is wrong with a distance-matrix entry.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum DistanceFault {
    /// Entry is less than zero
    Negative,
    /// Entry is NaN or infinite
    NonFinite,
    /// Diagonal entry differs from zero beyond tolerance
    NonZeroDiagonal,
    /// `d[i][j]` and `d[j][i]` differ beyond tolerance
    Asymmetric,
}

impl fmt::Display for DistanceFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DistanceFault::Negative => write!(f, "negative"),
            DistanceFault::NonFinite => write!(f, "not finite"),
            DistanceFault::NonZeroDiagonal => write!(f, "non-zero on the diagonal"),
            DistanceFault::Asymmetric => write!(f, "asymmetric"),
        }
    }
}

// =#========================================================================#=
// CONSTRUCT ERROR
// =#========================================================================#=
/// Error type covering everything that can go wrong between receiving a
/// distance matrix and returning a Newick string.
///
/// All input validation errors are raised before any algorithmic work
/// begins; only [NonFiniteDistance](ConstructError::NonFiniteDistance)
/// can occur mid-run, and it aborts the run. Negative computed branch
/// lengths are *not* errors; they are clamped and counted in
/// [Diagnostics](crate::algo::Diagnostics).
#[derive(PartialEq, Debug, Clone)]
pub enum ConstructError {
    /// Flat distance input has the wrong number of entries for `n` taxa.
    FlatLengthMismatch {
        /// Expected entry count (`n * n`)
        expected: usize,
        /// Entries actually supplied
        found: usize,
    },
    /// Nested distance input has the wrong number of rows.
    RowCountMismatch {
        /// Expected row count (`n`)
        expected: usize,
        /// Rows actually supplied
        found: usize,
    },
    /// A row of nested distance input has the wrong length.
    RaggedRow {
        /// Index of the offending row
        row: usize,
        /// Expected row length (`n`)
        expected: usize,
        /// Length actually found
        found: usize,
    },
    /// A distance entry violates the matrix contract.
    InvalidDistance {
        /// Row of the offending entry
        row: usize,
        /// Column of the offending entry
        col: usize,
        /// The offending value
        value: f64,
        /// Which contract the entry violates
        fault: DistanceFault,
    },
    /// Two taxa share the same label.
    DuplicateLabel(String),
    /// Fewer than three taxa were supplied.
    TooFewTaxa(usize),
    /// The requested algorithm name is not registered.
    UnknownAlgorithm(String),
    /// Requested output precision is negative.
    InvalidPrecision(i32),
    /// A distance update produced a NaN or infinite value; the run is aborted.
    NonFiniteDistance {
        /// Row of the blown-up entry
        row: usize,
        /// Column of the blown-up entry
        col: usize,
    },
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstructError::FlatLengthMismatch { expected, found } => write!(
                f,
                "Distance matrix contains {found} elements (should be {expected})"
            ),
            ConstructError::RowCountMismatch { expected, found } => write!(
                f,
                "Distance matrix has {found} rows (should be {expected})"
            ),
            ConstructError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "Row {row} of the distance matrix has {found} entries (should be {expected})"
            ),
            ConstructError::InvalidDistance {
                row,
                col,
                value,
                fault,
            } => write!(
                f,
                "Distance entry [{row}][{col}] = {value} is {fault}"
            ),
            ConstructError::DuplicateLabel(label) => {
                write!(f, "Taxon label {label:?} appears more than once")
            }
            ConstructError::TooFewTaxa(n) => {
                write!(f, "Only {n} taxa supplied (must have at least 3)")
            }
            ConstructError::UnknownAlgorithm(name) => {
                write!(f, "Algorithm {name:?} not found")
            }
            ConstructError::InvalidPrecision(p) => {
                write!(f, "Cannot have precision ({p}) less than 0")
            }
            ConstructError::NonFiniteDistance { row, col } => write!(
                f,
                "Distance update produced a non-finite value at [{row}][{col}]"
            ),
        }
    }
}

impl Error for ConstructError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
