//! Transient registration space for grouped-run rules.
//!
//! While rules are being registered for a definition, each grouped run is
//! recorded as a `[axis, stride, offset, bin]` 4-tuple in a deduplicating
//! ordered set. The set is collapsed into per-axis run lists when rules are
//! read; it is never persisted. `BTreeSet` keeps enumeration order stable
//! across rebuilds regardless of registration order.

use std::collections::BTreeSet;

use super::rule::GroupedRun;

/// Deduplicating ordered set of `[axis, stride, offset, bin]` registrations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapSpace {
    entries: BTreeSet<[i64; 4]>,
}

impl MapSpace {
    /// Create an empty map space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one grouped run for an axis. Returns false if the tuple was
    /// already present (re-registration is idempotent).
    pub fn insert(&mut self, axis: usize, stride: i64, offset: i64, bin: i64) -> bool {
        self.entries.insert([axis as i64, stride, offset, bin])
    }

    /// Check if any run is registered for the given axis.
    pub fn has_axis(&self, axis: usize) -> bool {
        let axis = axis as i64;
        self.entries.iter().any(|e| e[0] == axis)
    }

    /// Collapse the registrations for one axis into its ordered run list.
    pub fn runs_for_axis(&self, axis: usize) -> Vec<GroupedRun> {
        let axis = axis as i64;
        self.entries
            .iter()
            .filter(|e| e[0] == axis)
            .map(|e| GroupedRun { stride: e[1], offset: e[2], bin: e[3] })
            .collect()
    }

    /// Number of registered tuples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no tuples are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all registrations.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
