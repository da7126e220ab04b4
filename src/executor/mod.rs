//! N-dimensional Cartesian execution.
//!
//! [`GridExecutor`] iterates every integer tuple inside a box of inclusive
//! per-dimension bounds, in row-major order (last dimension fastest), and
//! invokes a callback once per tuple. The parallel mode in [`parallel`]
//! dispatches the identical enumeration across a channel-fed worker pool.

mod parallel;

use crate::error::{Error, Result};

// =============================================================================
// GridExecutor
// =============================================================================

/// Cartesian iterator over a box of inclusive per-dimension bounds.
///
/// The cursor advances with an odometer increment: dimensions are scanned
/// last to first, the current dimension is incremented, and overflow resets
/// it to its minimum and carries into the previous dimension. Enumeration
/// stops when the carry propagates past the first dimension. Every tuple is
/// visited exactly once and a finished executor can be re-run.
#[derive(Clone, Debug)]
pub struct GridExecutor {
    min: Vec<i64>,
    max: Vec<i64>,
}

impl GridExecutor {
    /// Create an executor over inclusive bounds `[min[i], max[i]]` per dimension.
    pub fn new(min: Vec<i64>, max: Vec<i64>) -> Result<Self> {
        if min.len() != max.len() {
            return Err(Error::InvalidBounds(format!(
                "bound arrays differ in length: {} vs {}",
                min.len(),
                max.len()
            )));
        }
        if min.is_empty() {
            return Err(Error::InvalidBounds("bounds are empty".into()));
        }
        for (d, (&lo, &hi)) in min.iter().zip(&max).enumerate() {
            if lo > hi {
                return Err(Error::InvalidBounds(format!(
                    "dimension {d}: min {lo} > max {hi}"
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Number of dimensions.
    #[inline]
    pub fn n_dims(&self) -> usize {
        self.min.len()
    }

    /// Total number of tuples in the box.
    pub fn n_cells(&self) -> u64 {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(&lo, &hi)| (hi - lo + 1) as u64)
            .product()
    }

    /// Inclusive lower bounds.
    #[inline]
    pub fn min_bounds(&self) -> &[i64] {
        &self.min
    }

    /// Inclusive upper bounds.
    #[inline]
    pub fn max_bounds(&self) -> &[i64] {
        &self.max
    }

    /// Visit every tuple in row-major order, invoking `callback` per tuple.
    ///
    /// The first callback error aborts the scan and is returned.
    pub fn execute<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(&[i64]) -> Result<()>,
    {
        let mut cursor = self.min.clone();
        loop {
            callback(&cursor)?;
            if !advance(&mut cursor, &self.min, &self.max) {
                return Ok(());
            }
        }
    }
}

/// Odometer increment: scan last dimension to first, carry on overflow.
/// Returns false once the carry passes the first dimension.
fn advance(cursor: &mut [i64], min: &[i64], max: &[i64]) -> bool {
    for d in (0..cursor.len()).rev() {
        cursor[d] += 1;
        if cursor[d] <= max[d] {
            return true;
        }
        cursor[d] = min[d];
    }
    false
}

// =============================================================================
// Tests
// =============================================================================
