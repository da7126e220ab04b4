//! Axis descriptors for one dimension of the elementary grid.
//!
//! An [`Axis`] is an immutable description of one dimension's elementary
//! bins: either numeric (ordered edges) or categorical (labels). Bin queries
//! are 1-based, matching the coordinate convention used by the rest of the
//! crate. Only the name may change after construction.

use crate::error::{Error, Result};

// =============================================================================
// AxisKind
// =============================================================================

/// Whether an axis carries numeric edges or categorical labels.
#[derive(Clone, Debug, PartialEq)]
pub enum AxisKind {
    /// Numeric axis: `n + 1` strictly ascending finite edges for `n` bins.
    Numeric { edges: Box<[f64]> },
    /// Categorical axis: one label per bin, order significant.
    Categorical { labels: Box<[String]> },
}

// =============================================================================
// Axis
// =============================================================================

/// Immutable descriptor of one dimension's elementary bins.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    name: String,
    kind: AxisKind,
}

impl Axis {
    /// Create a numeric axis with `n_bins` uniform bins spanning `[low, high)`.
    pub fn numeric(name: impl Into<String>, n_bins: usize, low: f64, high: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::InvalidAxis("bin count must be at least 1".into()));
        }
        if !low.is_finite() || !high.is_finite() {
            return Err(Error::InvalidAxis("axis span must be finite".into()));
        }
        if high <= low {
            return Err(Error::InvalidAxis(format!(
                "axis span is empty: low {low} >= high {high}"
            )));
        }
        let width = (high - low) / n_bins as f64;
        let edges: Vec<f64> = (0..=n_bins).map(|i| low + width * i as f64).collect();
        Self::with_edges(name, edges)
    }

    /// Create a numeric axis from explicit bin edges (`n + 1` edges for `n` bins).
    ///
    /// Edges must be finite and strictly ascending.
    pub fn with_edges(name: impl Into<String>, edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidAxis(format!(
                "numeric axis needs at least 2 edges, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::InvalidAxis("bin edges must be finite".into()));
        }
        for pair in edges.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::InvalidAxis(format!(
                    "bin edges must be strictly ascending: {} then {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            kind: AxisKind::Numeric { edges: edges.into_boxed_slice() },
        })
    }

    /// Create a categorical axis with one label per bin.
    pub fn categorical(name: impl Into<String>, labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::InvalidAxis("bin count must be at least 1".into()));
        }
        Ok(Self {
            name: name.into(),
            kind: AxisKind::Categorical { labels: labels.into_boxed_slice() },
        })
    }

    /// Axis name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the axis. The only mutation an axis supports.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of elementary bins.
    #[inline]
    pub fn elementary_bin_count(&self) -> usize {
        match &self.kind {
            AxisKind::Numeric { edges } => edges.len() - 1,
            AxisKind::Categorical { labels } => labels.len(),
        }
    }

    /// Check if this axis is categorical.
    #[inline]
    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, AxisKind::Categorical { .. })
    }

    /// Axis kind (numeric edges or categorical labels).
    #[inline]
    pub fn kind(&self) -> &AxisKind {
        &self.kind
    }

    /// Low edge of elementary bin `i` (1-based). Numeric axes only.
    pub fn bin_low_edge(&self, i: usize) -> Result<f64> {
        match &self.kind {
            AxisKind::Numeric { edges } => {
                self.check_bin(i)?;
                Ok(edges[i - 1])
            }
            AxisKind::Categorical { .. } => Err(Error::InvalidAxis(format!(
                "axis '{}' is categorical and has no numeric edges",
                self.name
            ))),
        }
    }

    /// High edge of elementary bin `i` (1-based). Numeric axes only.
    pub fn bin_high_edge(&self, i: usize) -> Result<f64> {
        match &self.kind {
            AxisKind::Numeric { edges } => {
                self.check_bin(i)?;
                Ok(edges[i])
            }
            AxisKind::Categorical { .. } => Err(Error::InvalidAxis(format!(
                "axis '{}' is categorical and has no numeric edges",
                self.name
            ))),
        }
    }

    /// Label of elementary bin `i` (1-based). Categorical axes only.
    pub fn bin_label(&self, i: usize) -> Result<&str> {
        match &self.kind {
            AxisKind::Categorical { labels } => {
                self.check_bin(i)?;
                Ok(&labels[i - 1])
            }
            AxisKind::Numeric { .. } => Err(Error::InvalidAxis(format!(
                "axis '{}' is numeric and has no labels",
                self.name
            ))),
        }
    }

    fn check_bin(&self, i: usize) -> Result<()> {
        let n = self.elementary_bin_count();
        if i < 1 || i > n {
            return Err(Error::InvalidAxis(format!(
                "bin {i} out of range for axis '{}' with {n} bins",
                self.name
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
