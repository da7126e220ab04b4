//! Per-axis rebinning rules.
//!
//! Every axis of a binning definition carries exactly one [`AxisRule`].
//! `Single` and `UserFixed` collapse the whole axis to one reduced position
//! and contribute one coordinate component; `Grouped` partitions the axis
//! into consecutive runs and contributes three components per coordinate.

// =============================================================================
// GroupedRun
// =============================================================================

/// One consecutive run of elementary bins: `(stride, offset, bin)`.
///
/// The run covers elementary bins `stride * (bin - 1) + offset` through
/// `stride * (bin - 1) + offset + stride - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupedRun {
    /// Number of elementary bins folded into the run.
    pub stride: i64,
    /// Elementary bin the run family starts at.
    pub offset: i64,
    /// 1-based run id within its `(stride, offset)` family.
    pub bin: i64,
}

impl GroupedRun {
    /// Reduced-coordinate components contributed by this run.
    #[inline]
    pub fn components(&self) -> [i64; 3] {
        [self.stride, self.offset, self.bin]
    }
}

// =============================================================================
// AxisRule
// =============================================================================

/// How one axis maps its elementary bins onto reduced positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AxisRule {
    /// Whole axis collapses to one reduced position, stored verbatim.
    Single { position: i64 },
    /// Axis partitioned into consecutive runs.
    Grouped { runs: Vec<GroupedRun> },
    /// Like `Single`, but the position is user-managed and exempt from
    /// automatic rule assignment.
    UserFixed { position: i64 },
}

impl Default for AxisRule {
    fn default() -> Self {
        Self::Single { position: 1 }
    }
}

impl AxisRule {
    /// Number of reduced-coordinate components this rule contributes.
    #[inline]
    pub fn n_components(&self) -> usize {
        match self {
            Self::Single { .. } | Self::UserFixed { .. } => 1,
            Self::Grouped { .. } => 3,
        }
    }

    /// Check if this rule is grouped.
    #[inline]
    pub fn is_grouped(&self) -> bool {
        matches!(self, Self::Grouped { .. })
    }

    /// Number of admissible reduced positions along this axis.
    #[inline]
    pub fn n_selections(&self) -> usize {
        match self {
            Self::Single { .. } | Self::UserFixed { .. } => 1,
            Self::Grouped { runs } => runs.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_is_single_at_one() {
        assert_eq!(AxisRule::default(), AxisRule::Single { position: 1 });
        assert_eq!(AxisRule::default().n_components(), 1);
    }

    #[test]
    fn test_grouped_components() {
        let run = GroupedRun { stride: 3, offset: 1, bin: 2 };
        assert_eq!(run.components(), [3, 1, 2]);

        let rule = AxisRule::Grouped { runs: vec![run, run] };
        assert_eq!(rule.n_components(), 3);
        assert_eq!(rule.n_selections(), 2);
        assert!(rule.is_grouped());
    }
}
