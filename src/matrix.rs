//! Validated square distance matrix with in-place shrinking.
//!
//! [DistanceMatrix] is the working structure every clustering step reads
//! and writes. It is loaded once from caller input (flat row-major slice
//! or nested rows), validated against the distance-matrix contract, and
//! then shrunk by one row/column per merge.
//!
//! Shrinking never reallocates: the merged cluster's new distances are
//! written over row/column `a`, and row/column `b` is removed by copying
//! the *last* row/column over it and decrementing the live size. All rows
//! below the live size stay in use all the time, so the hot scan loops
//! need no liveness checks.

use crate::error::{ConstructError, DistanceFault};

/// Tolerance used for diagonal and symmetry validation when the caller
/// does not supply one.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// =#========================================================================#=
// DISTANCE MATRIX
// =#========================================================================#=
/// Square, symmetric, zero-diagonal matrix of pairwise distances.
///
/// Backed by a single flat row-major `Vec<f64>` with a fixed stride (the
/// initial taxon count), so row starts stay put while the live size
/// shrinks during clustering.
///
/// # Invariants
/// - `distance(i, j) == distance(j, i)` for all live `i`, `j`
/// - `distance(i, i) == 0`
/// - every live entry is finite and non-negative on load; merges clamp
///   computed distances to keep it that way
///
/// Input that violates these beyond the given tolerance is rejected at
/// construction with [ConstructError]. Entries within tolerance are
/// repaired (diagonal zeroed, off-diagonal pairs averaged) so downstream
/// arithmetic sees an exactly symmetric matrix.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    /// Row stride of the flat storage (initial size, never changes)
    stride: usize,
    /// Current number of live rows/columns
    size: usize,
    /// Flat row-major storage
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds a matrix for `n` taxa from a flat row-major slice of `n * n`
    /// values, using [DEFAULT_TOLERANCE].
    ///
    /// # Arguments
    /// * `n` - Taxon count (matrix dimension)
    /// * `data` - `n * n` distances in row-major order
    ///
    /// # Errors
    /// [ConstructError::FlatLengthMismatch] if `data.len() != n * n`, or
    /// any of the value errors described in
    /// [from_flat_with_tolerance](Self::from_flat_with_tolerance).
    pub fn from_flat(n: usize, data: &[f64]) -> Result<Self, ConstructError> {
        Self::from_flat_with_tolerance(n, data, DEFAULT_TOLERANCE)
    }

    /// Builds a matrix for `n` taxa from a flat row-major slice, with an
    /// explicit diagonal/symmetry tolerance.
    ///
    /// # Errors
    /// * [ConstructError::FlatLengthMismatch] on a wrong-sized slice
    /// * [ConstructError::InvalidDistance] for negative or non-finite
    ///   entries, a diagonal entry beyond tolerance, or an asymmetric
    ///   pair beyond tolerance
    pub fn from_flat_with_tolerance(
        n: usize,
        data: &[f64],
        tolerance: f64,
    ) -> Result<Self, ConstructError> {
        if data.len() != n * n {
            return Err(ConstructError::FlatLengthMismatch {
                expected: n * n,
                found: data.len(),
            });
        }
        Self::validated(n, data.to_vec(), tolerance)
    }

    /// Builds a matrix for `n` taxa from nested rows, using
    /// [DEFAULT_TOLERANCE].
    ///
    /// # Errors
    /// * [ConstructError::RowCountMismatch] if there are not `n` rows
    /// * [ConstructError::RaggedRow] naming the first row whose length
    ///   is not `n`
    /// * the value errors described in
    ///   [from_flat_with_tolerance](Self::from_flat_with_tolerance)
    pub fn from_rows(n: usize, rows: &[Vec<f64>]) -> Result<Self, ConstructError> {
        Self::from_rows_with_tolerance(n, rows, DEFAULT_TOLERANCE)
    }

    /// Builds a matrix for `n` taxa from nested rows, with an explicit
    /// diagonal/symmetry tolerance.
    pub fn from_rows_with_tolerance(
        n: usize,
        rows: &[Vec<f64>],
        tolerance: f64,
    ) -> Result<Self, ConstructError> {
        if rows.len() != n {
            return Err(ConstructError::RowCountMismatch {
                expected: n,
                found: rows.len(),
            });
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(ConstructError::RaggedRow {
                    row: index,
                    expected: n,
                    found: row.len(),
                });
            }
        }

        let mut values = Vec::with_capacity(n * n);
        for row in rows {
            values.extend_from_slice(row);
        }
        Self::validated(n, values, tolerance)
    }

    /// Validates entries and repairs within-tolerance imperfections.
    fn validated(n: usize, mut values: Vec<f64>, tolerance: f64) -> Result<Self, ConstructError> {
        for row in 0..n {
            for col in 0..n {
                let value = values[row * n + col];
                if !value.is_finite() {
                    return Err(ConstructError::InvalidDistance {
                        row,
                        col,
                        value,
                        fault: DistanceFault::NonFinite,
                    });
                }
                if value < 0.0 {
                    return Err(ConstructError::InvalidDistance {
                        row,
                        col,
                        value,
                        fault: DistanceFault::Negative,
                    });
                }
            }
        }

        // Diagonal: reject beyond tolerance, zero the rest
        for i in 0..n {
            let value = values[i * n + i];
            if value.abs() > tolerance {
                return Err(ConstructError::InvalidDistance {
                    row: i,
                    col: i,
                    value,
                    fault: DistanceFault::NonZeroDiagonal,
                });
            }
            values[i * n + i] = 0.0;
        }

        // Symmetry: reject beyond tolerance, average the rest
        for row in 0..n {
            for col in (row + 1)..n {
                let upper = values[row * n + col];
                let lower = values[col * n + row];
                if (upper - lower).abs() > tolerance {
                    return Err(ConstructError::InvalidDistance {
                        row,
                        col,
                        value: upper,
                        fault: DistanceFault::Asymmetric,
                    });
                }
                let mean = 0.5 * (upper + lower);
                values[row * n + col] = mean;
                values[col * n + row] = mean;
            }
        }

        Ok(DistanceMatrix {
            stride: n,
            size: n,
            values,
        })
    }

    /// Returns the current number of live rows/columns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the distance between live rows `i` and `j`.
    ///
    /// # Panics
    /// Panics (in debug builds) if `i` or `j` is not a live row.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.size && j < self.size);
        self.values[i * self.stride + j]
    }

    /// Sets the distance between live rows `i` and `j`, keeping the
    /// matrix symmetric.
    #[inline]
    pub fn set_distance(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.size && j < self.size);
        self.values[i * self.stride + j] = value;
        self.values[j * self.stride + i] = value;
    }

    /// Returns the sum of distances from live row `i` to every other
    /// live row (the cluster's divergence).
    pub fn row_total(&self, i: usize) -> f64 {
        let row = &self.values[i * self.stride..i * self.stride + self.size];
        row.iter().sum()
    }

    /// Returns the divergence of every live row. Used once at
    /// initialization; merges maintain divergences incrementally.
    pub fn row_totals(&self) -> Vec<f64> {
        (0..self.size).map(|i| self.row_total(i)).collect()
    }

    /// Returns the smallest off-diagonal entry of live row `i`.
    ///
    /// # Panics
    /// Panics (in debug builds) if fewer than two rows are live.
    pub fn row_min(&self, i: usize) -> f64 {
        debug_assert!(self.size > 1);
        let row = &self.values[i * self.stride..i * self.stride + self.size];
        row.iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &v)| v)
            .fold(f64::INFINITY, f64::min)
    }

    /// Removes row and column `idx` by copying the last live row/column
    /// over it and shrinking the live size by one.
    ///
    /// After the call, the cluster that occupied the last row occupies
    /// row `idx`; callers tracking row identities must apply the same
    /// move (see [ClusterRegistry](crate::algo::ClusterRegistry)).
    pub fn remove_row_and_column(&mut self, idx: usize) {
        debug_assert!(idx < self.size);
        let last = self.size - 1;
        if idx != last {
            // Column first: entry (last, idx) becomes d(last, last) = 0,
            // which the row copy then places on the new diagonal.
            for row in 0..self.size {
                let moved = self.values[row * self.stride + last];
                self.values[row * self.stride + idx] = moved;
            }
            for col in 0..self.size {
                let moved = self.values[last * self.stride + col];
                self.values[idx * self.stride + col] = moved;
            }
        }
        self.size = last;
    }
}

// =#========================================================================#=
// DISTANCE INPUT
// =#========================================================================#=
/// Caller-supplied distance data, either a flat row-major slice of
/// `n * n` values or `n` nested rows of length `n`.
#[derive(Debug, Clone, Copy)]
pub enum DistanceInput<'a> {
    /// Flat row-major `n * n` slice
    Flat(&'a [f64]),
    /// `n` rows of `n` entries each
    Rows(&'a [Vec<f64>]),
}

impl DistanceInput<'_> {
    /// Validates the input against taxon count `n` and builds the matrix.
    pub(crate) fn into_matrix(
        self,
        n: usize,
        tolerance: f64,
    ) -> Result<DistanceMatrix, ConstructError> {
        match self {
            DistanceInput::Flat(data) => {
                DistanceMatrix::from_flat_with_tolerance(n, data, tolerance)
            }
            DistanceInput::Rows(rows) => {
                DistanceMatrix::from_rows_with_tolerance(n, rows, tolerance)
            }
        }
    }
}

// =$========================================================================$=
// TESTS
// =$========================================================================$=
#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_4x4() -> DistanceMatrix {
        // Symmetric with distinct off-diagonal values
        let data = vec![
            0.0, 1.0, 2.0, 3.0, //
            1.0, 0.0, 4.0, 5.0, //
            2.0, 4.0, 0.0, 6.0, //
            3.0, 5.0, 6.0, 0.0,
        ];
        DistanceMatrix::from_flat(4, &data).unwrap()
    }

    #[test]
    fn swap_removal_keeps_remaining_distances() {
        let mut m = matrix_4x4();
        m.remove_row_and_column(1);

        // Rows are now [0, 3, 2]
        assert_eq!(m.size(), 3);
        assert_eq!(m.distance(0, 1), 3.0);
        assert_eq!(m.distance(0, 2), 2.0);
        assert_eq!(m.distance(1, 2), 6.0);
        for i in 0..3 {
            assert_eq!(m.distance(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(m.distance(i, j), m.distance(j, i));
            }
        }
    }

    #[test]
    fn removing_last_row_just_shrinks() {
        let mut m = matrix_4x4();
        m.remove_row_and_column(3);
        assert_eq!(m.size(), 3);
        assert_eq!(m.distance(1, 2), 4.0);
    }

    #[test]
    fn row_totals_sum_live_entries() {
        let m = matrix_4x4();
        assert_eq!(m.row_total(0), 6.0);
        assert_eq!(m.row_totals(), vec![6.0, 10.0, 12.0, 14.0]);
    }

    #[test]
    fn row_min_skips_diagonal() {
        let m = matrix_4x4();
        assert_eq!(m.row_min(0), 1.0);
        assert_eq!(m.row_min(3), 3.0);
    }

    #[test]
    fn within_tolerance_asymmetry_is_averaged() {
        let data = vec![
            0.0, 1.0, 2.0, //
            1.0 + 1e-12, 0.0, 3.0, //
            2.0, 3.0, 0.0,
        ];
        let m = DistanceMatrix::from_flat(3, &data).unwrap();
        assert_eq!(m.distance(0, 1), m.distance(1, 0));
    }
}
