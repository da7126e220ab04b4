//! Reduced coordinates and the sparse content space keyed by them.

use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// ReducedCoord
// =============================================================================

/// Address of one reduced bin: the axiswise concatenation of each axis
/// rule's components, in axis declaration order.
///
/// Single/UserFixed axes contribute one component (the stored position);
/// grouped axes contribute `[stride, offset, bin]`. The total arity is fixed
/// once the definition's rule set is assigned.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReducedCoord(Vec<i64>);

impl ReducedCoord {
    /// Build a coordinate from its components.
    pub fn new(components: Vec<i64>) -> Self {
        Self(components)
    }

    /// Flat component list.
    #[inline]
    pub fn components(&self) -> &[i64] {
        &self.0
    }

    /// Number of components (not axes).
    #[inline]
    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<i64>> for ReducedCoord {
    fn from(components: Vec<i64>) -> Self {
        Self(components)
    }
}

impl fmt::Display for ReducedCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

// =============================================================================
// ContentSpace
// =============================================================================

/// Sparse map from [`ReducedCoord`] to content id.
///
/// Backed by a `BTreeMap` so iteration order is deterministic. The space is
/// rebuilt, never patched in place, whenever a definition's rules change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentSpace {
    cells: BTreeMap<ReducedCoord, i64>,
}

impl ContentSpace {
    /// Create an empty content space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content id of the given cell, if occupied.
    pub fn get(&self, coord: &ReducedCoord) -> Option<i64> {
        self.cells.get(coord).copied()
    }

    /// Check if a cell is occupied.
    pub fn is_occupied(&self, coord: &ReducedCoord) -> bool {
        self.cells.contains_key(coord)
    }

    /// Occupy a cell with a content id. Returns the previous occupant, if any.
    pub fn insert(&mut self, coord: ReducedCoord, id: i64) -> Option<i64> {
        self.cells.insert(coord, id)
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell is occupied.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Occupied cells in deterministic (coordinate) order.
    pub fn iter(&self) -> impl Iterator<Item = (&ReducedCoord, i64)> {
        self.cells.iter().map(|(coord, &id)| (coord, id))
    }

    /// Drop every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
