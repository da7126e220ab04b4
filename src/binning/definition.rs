//! Named binning definitions.
//!
//! A [`BinningDefinition`] bundles one complete rule assignment across all
//! axes with its own content space, the ordered list of elementary entry ids
//! it has accepted, and a cell arena mapping each content id back to the
//! reduced coordinate it occupies. Several definitions may coexist over the
//! same axis set with different rules (coarse vs fine).

use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::content::{ContentSpace, ReducedCoord};
use super::map_space::MapSpace;
use super::rule::AxisRule;

/// One named rule assignment plus the state it has accumulated.
#[derive(Clone, Debug)]
pub struct BinningDefinition {
    name: String,
    /// Exactly one rule per axis, in axis declaration order.
    rules: Vec<AxisRule>,
    /// Transient registration space for grouped runs. Not persisted.
    map_space: MapSpace,
    content: ContentSpace,
    /// Ordered, mutable list of accepted elementary entry ids.
    ids: Vec<i64>,
    /// Cell arena: content id -> the reduced coordinate it occupies.
    cells: BTreeMap<i64, ReducedCoord>,
}

impl BinningDefinition {
    pub(crate) fn new(name: impl Into<String>, n_axes: usize) -> Self {
        Self {
            name: name.into(),
            rules: vec![AxisRule::default(); n_axes],
            map_space: MapSpace::new(),
            content: ContentSpace::new(),
            ids: Vec::new(),
            cells: BTreeMap::new(),
        }
    }

    /// Definition name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of axes this definition rules.
    #[inline]
    pub fn n_axes(&self) -> usize {
        self.rules.len()
    }

    /// Rule for one axis.
    pub fn rule(&self, axis: usize) -> Result<&AxisRule> {
        self.rules.get(axis).ok_or_else(|| {
            Error::InvalidBinning(format!(
                "axis {axis} out of range for definition '{}' with {} axes",
                self.name,
                self.rules.len()
            ))
        })
    }

    /// All rules in axis declaration order.
    #[inline]
    pub fn rules(&self) -> &[AxisRule] {
        &self.rules
    }

    pub(crate) fn set_rule(&mut self, axis: usize, rule: AxisRule) {
        self.rules[axis] = rule;
    }

    pub(crate) fn map_space(&self) -> &MapSpace {
        &self.map_space
    }

    pub(crate) fn map_space_mut(&mut self) -> &mut MapSpace {
        &mut self.map_space
    }

    /// Drop content, ids, and the cell arena. Called whenever rules change:
    /// content space is rebuilt, never patched in place.
    pub(crate) fn clear_derived(&mut self) {
        self.content.clear();
        self.ids.clear();
        self.cells.clear();
    }

    /// Occupy a cell and record it in the arena.
    pub(crate) fn occupy(&mut self, coord: ReducedCoord, id: i64) {
        self.content.insert(coord.clone(), id);
        self.cells.insert(id, coord);
    }

    /// Elementary entry id at a given position in the id list.
    pub fn id_at(&self, index: usize) -> Result<i64> {
        self.ids
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange { index, len: self.ids.len() })
    }

    /// Ordered id list.
    #[inline]
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Mutable access to the ordered id list.
    #[inline]
    pub fn ids_mut(&mut self) -> &mut Vec<i64> {
        &mut self.ids
    }

    /// Content space keyed by reduced coordinate.
    #[inline]
    pub fn content(&self) -> &ContentSpace {
        &self.content
    }

    /// Reduced coordinate a content id occupies, if known to the arena.
    pub fn coord_of(&self, id: i64) -> Option<&ReducedCoord> {
        self.cells.get(&id)
    }

    pub(crate) fn cells(&self) -> &BTreeMap<i64, ReducedCoord> {
        &self.cells
    }

    pub(crate) fn restore(
        name: String,
        rules: Vec<AxisRule>,
        ids: Vec<i64>,
        cells: BTreeMap<i64, ReducedCoord>,
        map_space: MapSpace,
    ) -> Self {
        let mut def = Self {
            name,
            rules,
            map_space,
            content: ContentSpace::new(),
            ids,
            cells,
        };
        // Content is derived state; rebuild rather than persist it.
        for (id, coord) in &def.cells {
            def.content.insert(coord.clone(), *id);
        }
        def
    }

    /// Rebuild the content space strictly from the id list.
    ///
    /// Ids unknown to the cell arena fail with `InvalidBinning`.
    pub fn refresh_content_from_ids(&mut self) -> Result<()> {
        let mut content = ContentSpace::new();
        for &id in &self.ids {
            let coord = self.cells.get(&id).ok_or_else(|| {
                Error::InvalidBinning(format!(
                    "id {id} has no cell in definition '{}'",
                    self.name
                ))
            })?;
            content.insert(coord.clone(), id);
        }
        self.content = content;
        Ok(())
    }

    /// Rebuild the id list strictly from occupied content cells, in content
    /// (coordinate) order.
    pub fn refresh_ids_from_content(&mut self) {
        self.ids = self.content.iter().map(|(_, id)| id).collect();
    }
}

// =============================================================================
// Tests
// =============================================================================
