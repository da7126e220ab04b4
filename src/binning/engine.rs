//! The binning engine: axis arena plus named definitions.
//!
//! The engine owns the axis list and every [`BinningDefinition`] built over
//! it. Rule registration goes through the engine so that rules, the map
//! space, and the content-rebuild contract stay consistent: any registration
//! that changes an axis rule clears the definition's derived state, and
//! [`BinningEngine::fill_all`] repopulates it by enumerating the reduced
//! coordinate space with the grid executor.

use std::collections::BTreeMap;

use crate::axis::Axis;
use crate::error::{Error, Result};
use crate::executor::GridExecutor;
use crate::storage::{DatasetStorage, Record};

use super::content::ReducedCoord;
use super::definition::BinningDefinition;
use super::rule::AxisRule;

/// Owner of axes and named binning definitions.
#[derive(Clone, Debug, Default)]
pub struct BinningEngine {
    axes: Vec<Axis>,
    definitions: BTreeMap<String, BinningDefinition>,
}

impl BinningEngine {
    /// Create an engine with no axes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine over the given axes.
    pub fn with_axes(axes: Vec<Axis>) -> Self {
        Self { axes, definitions: BTreeMap::new() }
    }

    /// Append an axis, returning its index.
    ///
    /// Axes should be registered before definitions are created: a
    /// definition rules exactly the axes present at its creation.
    pub fn add_axis(&mut self, axis: Axis) -> usize {
        self.axes.push(axis);
        self.axes.len() - 1
    }

    /// Axis by index.
    pub fn axis(&self, index: usize) -> Result<&Axis> {
        self.axes.get(index).ok_or_else(|| {
            Error::InvalidAxis(format!(
                "axis {index} out of range, engine has {} axes",
                self.axes.len()
            ))
        })
    }

    /// All axes in declaration order.
    #[inline]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Number of axes.
    #[inline]
    pub fn n_axes(&self) -> usize {
        self.axes.len()
    }

    /// Create a new definition over the current axis set.
    ///
    /// Every axis starts ruled `Single` at position 1.
    pub fn add_definition(&mut self, name: impl Into<String>) -> Result<&mut BinningDefinition> {
        let name = name.into();
        if self.definitions.contains_key(&name) {
            return Err(Error::InvalidBinning(format!(
                "definition '{name}' already exists"
            )));
        }
        let def = BinningDefinition::new(name.clone(), self.axes.len());
        Ok(self.definitions.entry(name).or_insert(def))
    }

    /// Definition by name.
    pub fn definition(&self, name: &str) -> Result<&BinningDefinition> {
        self.definitions
            .get(name)
            .ok_or_else(|| Error::DefinitionNotFound(name.into()))
    }

    /// Mutable definition by name.
    pub fn definition_mut(&mut self, name: &str) -> Result<&mut BinningDefinition> {
        self.definitions
            .get_mut(name)
            .ok_or_else(|| Error::DefinitionNotFound(name.into()))
    }

    /// Registered definition names in deterministic order.
    pub fn definition_names(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    pub(crate) fn restore_definition(&mut self, def: BinningDefinition) {
        self.definitions.insert(def.name().to_string(), def);
    }

    // =========================================================================
    // Rule registration
    // =========================================================================

    /// Register `count` consecutive grouped runs for an axis, starting at
    /// `(stride, offset)` with run ids `1..=count`.
    ///
    /// Registration is idempotent: the map space deduplicates tuples.
    /// Switches the axis rule to `Grouped` and clears the definition's
    /// derived state (content, ids, cell arena) for rebuild.
    pub fn add_binning(
        &mut self,
        def_name: &str,
        axis: usize,
        stride: i64,
        offset: i64,
        count: i64,
    ) -> Result<()> {
        if axis >= self.axes.len() {
            return Err(Error::InvalidBinning(format!(
                "axis {axis} out of range, engine has {} axes",
                self.axes.len()
            )));
        }
        // Offset 0 is legal: interior cut points that are multiples of the
        // pair width land in a zero-offset family.
        if stride < 1 || offset < 0 || count < 1 {
            return Err(Error::InvalidBinning(format!(
                "stride {stride} and count {count} must be at least 1, offset {offset} must be non-negative"
            )));
        }
        let def = self.definition_mut(def_name)?;
        for bin in 1..=count {
            def.map_space_mut().insert(axis, stride, offset, bin);
        }
        let runs = def.map_space().runs_for_axis(axis);
        def.set_rule(axis, AxisRule::Grouped { runs });
        def.clear_derived();
        Ok(())
    }

    /// Register grouped runs from ascending 1-based elementary cut points.
    ///
    /// For each adjacent pair, `rebin = c[i] - c[i-1]`,
    /// `start = c[i-1] mod rebin`, `bin = c[i] / rebin`, except when
    /// `rebin == 1`, where `start = 1` and `bin = c[i-1]`. The stride-1
    /// special case keeps single-bin groups in the `(1, 1)` family, where
    /// the run id equals the elementary index; the general quotient would
    /// place them in the `(1, 0)` family whose first group lies below the
    /// axis. Kept verbatim pending confirmation against reference data.
    pub fn add_binning_variable(
        &mut self,
        def_name: &str,
        axis: usize,
        cuts: &[i64],
    ) -> Result<()> {
        let axis_bins = self
            .axes
            .get(axis)
            .ok_or_else(|| {
                Error::InvalidBinning(format!(
                    "axis {axis} out of range, engine has {} axes",
                    self.axes.len()
                ))
            })?
            .elementary_bin_count() as i64;

        if cuts.len() < 2 {
            return Err(Error::InvalidBinning(format!(
                "need at least 2 cut points, got {}",
                cuts.len()
            )));
        }
        for &c in cuts {
            if c < 1 || c > axis_bins + 1 {
                return Err(Error::InvalidBinning(format!(
                    "cut point {c} outside [1, {}] for axis {axis}",
                    axis_bins + 1
                )));
            }
        }

        for pair in cuts.windows(2) {
            let rebin = pair[1] - pair[0];
            if rebin < 1 {
                return Err(Error::InvalidBinning(format!(
                    "cut points must be strictly ascending: {} then {}",
                    pair[0], pair[1]
                )));
            }
            let (start, bin) = if rebin == 1 {
                (1, pair[0])
            } else {
                (pair[0] % rebin, pair[1] / rebin)
            };
            self.add_binning(def_name, axis, rebin, start, bin)?;
        }
        Ok(())
    }

    /// Register grouped runs from `(width, repeat)` pairs.
    ///
    /// A `None` repeat defaults to `elementary_bin_count / width`. The pairs
    /// expand into a cut-point list starting at 1 which is handed to
    /// [`BinningEngine::add_binning_variable`].
    pub fn add_binning_via_bin_widths(
        &mut self,
        def_name: &str,
        axis: usize,
        width_repeat_pairs: &[(i64, Option<i64>)],
    ) -> Result<()> {
        let axis_bins = self
            .axes
            .get(axis)
            .ok_or_else(|| {
                Error::InvalidBinning(format!(
                    "axis {axis} out of range, engine has {} axes",
                    self.axes.len()
                ))
            })?
            .elementary_bin_count() as i64;

        let mut cuts = vec![1i64];
        for &(width, repeat) in width_repeat_pairs {
            if width < 1 {
                return Err(Error::InvalidBinning(format!(
                    "bin width must be at least 1, got {width}"
                )));
            }
            let repeat = repeat.unwrap_or(axis_bins / width);
            for _ in 0..repeat {
                cuts.push(cuts.last().unwrap() + width);
            }
        }
        self.add_binning_variable(def_name, axis, &cuts)
    }

    /// Pin an axis to a user-managed reduced position (`UserFixed`).
    ///
    /// Clears the definition's derived state like any other rule change.
    pub fn fix_axis(&mut self, def_name: &str, axis: usize, position: i64) -> Result<()> {
        if axis >= self.axes.len() {
            return Err(Error::InvalidBinning(format!(
                "axis {axis} out of range, engine has {} axes",
                self.axes.len()
            )));
        }
        let def = self.definition_mut(def_name)?;
        def.set_rule(axis, AxisRule::UserFixed { position });
        def.clear_derived();
        Ok(())
    }

    // =========================================================================
    // Enumeration and inverse lookup
    // =========================================================================

    /// Enumerate the definition's reduced coordinate space and occupy every
    /// vacant cell, seeding one storage record per new cell.
    ///
    /// New content ids are appended to the id list in visitation order.
    /// Occupied cells are left alone, so repeated calls are incremental.
    /// Returns the number of newly filled cells.
    pub fn fill_all<S>(&mut self, def_name: &str, storage: &mut S) -> Result<usize>
    where
        S: DatasetStorage + ?Sized,
    {
        let def = self.definition(def_name)?;

        // Per-axis admissible selections: grouped runs in map-space order,
        // or the single stored position.
        let mut selections: Vec<Vec<Vec<i64>>> = Vec::with_capacity(def.n_axes());
        for rule in def.rules() {
            let axis_selections = match rule {
                AxisRule::Grouped { runs } => {
                    runs.iter().map(|r| r.components().to_vec()).collect()
                }
                AxisRule::Single { position } | AxisRule::UserFixed { position } => {
                    vec![vec![*position]]
                }
            };
            selections.push(axis_selections);
        }

        let min = vec![1i64; selections.len()];
        let max: Vec<i64> = selections.iter().map(|s| s.len() as i64).collect();
        let executor = GridExecutor::new(min, max)?;

        let mut coords = Vec::with_capacity(executor.n_cells() as usize);
        executor.execute(|tuple| {
            let mut components = Vec::new();
            for (axis, &pick) in tuple.iter().enumerate() {
                components.extend_from_slice(&selections[axis][(pick - 1) as usize]);
            }
            coords.push(ReducedCoord::new(components));
            Ok(())
        })?;

        let def = self.definitions.get_mut(def_name).expect("checked above");
        let mut filled = 0;
        for coord in coords {
            if def.content().is_occupied(&coord) {
                continue;
            }
            let id = storage.put(Record::seed(def.name(), &coord));
            def.occupy(coord, id);
            def.ids_mut().push(id);
            filled += 1;
        }
        Ok(filled)
    }

    /// Inverse mapping: the elementary bin range one axis's reduced
    /// components cover.
    ///
    /// Three components (grouped) map to
    /// `min = stride * (bin - 1) + offset`, `max = min + stride - 1`;
    /// one component (single or user-fixed) covers the full axis.
    pub fn axis_range_in_base(&self, axis: usize, components: &[i64]) -> Result<(i64, i64)> {
        let axis_bins = self.axis(axis)?.elementary_bin_count() as i64;
        match *components {
            [stride, offset, bin] => {
                let min = stride * (bin - 1) + offset;
                let max = min + stride - 1;
                if min < 1 || max > axis_bins {
                    return Err(Error::InvalidBinning(format!(
                        "group ({stride},{offset},{bin}) covers [{min},{max}] outside axis {axis} with {axis_bins} bins"
                    )));
                }
                Ok((min, max))
            }
            [_position] => Ok((1, axis_bins)),
            _ => Err(Error::InvalidBinning(format!(
                "expected 1 or 3 components, got {}",
                components.len()
            ))),
        }
    }

    /// Per-axis component spans inside a definition's reduced coordinates.
    pub fn reduced_spans(&self, def_name: &str) -> Result<Vec<std::ops::Range<usize>>> {
        let def = self.definition(def_name)?;
        let mut spans = Vec::with_capacity(def.n_axes());
        let mut offset = 0;
        for rule in def.rules() {
            let n = rule.n_components();
            spans.push(offset..offset + n);
            offset += n;
        }
        Ok(spans)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::binning::rule::GroupedRun;
    use crate::storage::MemoryStorage;
    use crate::testing::engine_xy;

    use super::*;

    fn engine_one_axis(n_bins: usize) -> BinningEngine {
        let mut engine = BinningEngine::new();
        engine
            .add_axis(Axis::numeric("x", n_bins, 0.0, n_bins as f64).unwrap());
        engine.add_definition("d").unwrap();
        engine
    }

    #[test]
    fn test_add_binning_validation() {
        let mut engine = engine_one_axis(9);
        assert!(matches!(
            engine.add_binning("d", 5, 1, 1, 1),
            Err(Error::InvalidBinning(_))
        ));
        assert!(engine.add_binning("d", 0, 0, 1, 1).is_err());
        assert!(engine.add_binning("d", 0, 1, -1, 1).is_err());
        assert!(engine.add_binning("d", 0, 1, 1, 0).is_err());
        assert!(engine.add_binning("d", 0, 3, 0, 2).is_ok());
        assert!(matches!(
            engine.add_binning("missing", 0, 1, 1, 1),
            Err(Error::DefinitionNotFound(_))
        ));
    }

    #[test]
    fn test_add_binning_is_idempotent() {
        let mut engine = engine_one_axis(8);
        engine.add_binning("d", 0, 2, 1, 3).unwrap();
        engine.add_binning("d", 0, 2, 1, 3).unwrap();
        let def = engine.definition("d").unwrap();
        match def.rule(0).unwrap() {
            AxisRule::Grouped { runs } => assert_eq!(runs.len(), 3),
            other => panic!("expected grouped rule, got {other:?}"),
        }
    }

    #[test]
    fn test_cut_points_on_nine_bin_axis() {
        // Cuts [1,4,7,10] on a 9-bin axis: three stride-3 runs in the
        // (3,1) family, the first two as named by the reference behavior.
        let mut engine = engine_one_axis(9);
        engine.add_binning_variable("d", 0, &[1, 4, 7, 10]).unwrap();

        let def = engine.definition("d").unwrap();
        let runs = match def.rule(0).unwrap() {
            AxisRule::Grouped { runs } => runs.clone(),
            other => panic!("expected grouped rule, got {other:?}"),
        };
        assert_eq!(runs[0], GroupedRun { stride: 3, offset: 1, bin: 1 });
        assert_eq!(runs[1], GroupedRun { stride: 3, offset: 1, bin: 2 });
        assert_eq!(runs.len(), 3);

        // Each run spans 3 elementary bins; together they cover the axis.
        assert_eq!(engine.axis_range_in_base(0, &[3, 1, 1]).unwrap(), (1, 3));
        assert_eq!(engine.axis_range_in_base(0, &[3, 1, 2]).unwrap(), (4, 6));
        assert_eq!(engine.axis_range_in_base(0, &[3, 1, 3]).unwrap(), (7, 9));
    }

    #[test]
    fn test_cut_point_at_width_multiple_starts_zero_offset_family() {
        // Cuts [1,3,6]: the (3,6) pair has 3 mod 3 == 0, so its run lands
        // in the (3, 0) family as (3,0,2) covering elementary bins 3..=5.
        let mut engine = engine_one_axis(9);
        engine.add_binning_variable("d", 0, &[1, 3, 6]).unwrap();

        let def = engine.definition("d").unwrap();
        let runs = match def.rule(0).unwrap() {
            AxisRule::Grouped { runs } => runs.clone(),
            other => panic!("expected grouped rule, got {other:?}"),
        };
        assert!(runs.contains(&GroupedRun { stride: 2, offset: 1, bin: 1 }));
        assert!(runs.contains(&GroupedRun { stride: 3, offset: 0, bin: 2 }));
        assert_eq!(engine.axis_range_in_base(0, &[3, 0, 2]).unwrap(), (3, 5));
    }

    #[test]
    fn test_rebin_one_special_case() {
        // Stride-1 pairs normalize onto (1, 1) with bin = c[i-1].
        let mut engine = engine_one_axis(5);
        engine.add_binning_variable("d", 0, &[1, 2, 3]).unwrap();

        let def = engine.definition("d").unwrap();
        let runs = match def.rule(0).unwrap() {
            AxisRule::Grouped { runs } => runs.clone(),
            other => panic!("expected grouped rule, got {other:?}"),
        };
        assert_eq!(
            runs,
            vec![
                GroupedRun { stride: 1, offset: 1, bin: 1 },
                GroupedRun { stride: 1, offset: 1, bin: 2 },
            ]
        );
        assert_eq!(engine.axis_range_in_base(0, &[1, 1, 1]).unwrap(), (1, 1));
        assert_eq!(engine.axis_range_in_base(0, &[1, 1, 2]).unwrap(), (2, 2));
    }

    #[test]
    fn test_cut_point_validation() {
        let mut engine = engine_one_axis(9);
        assert!(engine.add_binning_variable("d", 0, &[1]).is_err());
        assert!(engine.add_binning_variable("d", 0, &[1, 11]).is_err());
        assert!(engine.add_binning_variable("d", 0, &[4, 4]).is_err());
        assert!(engine.add_binning_variable("d", 0, &[7, 4]).is_err());
    }

    #[test]
    fn test_bin_widths_expand_to_cuts() {
        // Widths (3, x2) then (2, x1) on an 8-bin axis: cuts [1,4,7,9].
        let mut engine = engine_one_axis(8);
        engine
            .add_binning_via_bin_widths("d", 0, &[(3, Some(2)), (2, Some(1))])
            .unwrap();

        assert_eq!(engine.axis_range_in_base(0, &[3, 1, 1]).unwrap(), (1, 3));
        assert_eq!(engine.axis_range_in_base(0, &[3, 1, 2]).unwrap(), (4, 6));
        // The (2, 1) family: bin = 9 / 2 = 4 covers [7, 8].
        assert_eq!(engine.axis_range_in_base(0, &[2, 1, 4]).unwrap(), (7, 8));
    }

    #[test]
    fn test_bin_widths_default_repeat() {
        // Width 3 on a 9-bin axis defaults to 9 / 3 = 3 repeats.
        let mut engine = engine_one_axis(9);
        engine
            .add_binning_via_bin_widths("d", 0, &[(3, None)])
            .unwrap();
        let def = engine.definition("d").unwrap();
        assert_eq!(def.rule(0).unwrap().n_selections(), 3);
    }

    #[test]
    fn test_fill_all_single_then_grouped() {
        // X (4 bins) and Y (3 bins) both Single: one cell (1,1) mapping the
        // full 12-cell elementary grid. Re-ruling X to stride-2 groups grows
        // the space to 2 x-positions by 1 y-position.
        let mut engine = engine_xy();
        let mut storage = MemoryStorage::new();

        engine.add_definition("coarse").unwrap();
        let filled = engine.fill_all("coarse", &mut storage).unwrap();
        assert_eq!(filled, 1);

        let def = engine.definition("coarse").unwrap();
        let (coord, _) = def.content().iter().next().unwrap();
        assert_eq!(coord.components(), [1, 1]);
        assert_eq!(engine.axis_range_in_base(0, &[1]).unwrap(), (1, 4));
        assert_eq!(engine.axis_range_in_base(1, &[1]).unwrap(), (1, 3));

        engine.add_binning("coarse", 0, 2, 1, 2).unwrap();
        let filled = engine.fill_all("coarse", &mut storage).unwrap();
        assert_eq!(filled, 2);
        assert_eq!(engine.definition("coarse").unwrap().content().len(), 2);
    }

    #[test]
    fn test_fill_all_is_incremental() {
        let mut engine = engine_one_axis(6);
        engine.add_binning("d", 0, 2, 1, 3).unwrap();
        let mut storage = MemoryStorage::new();

        assert_eq!(engine.fill_all("d", &mut storage).unwrap(), 3);
        assert_eq!(engine.fill_all("d", &mut storage).unwrap(), 0);
        assert_eq!(engine.definition("d").unwrap().ids().len(), 3);
        assert_eq!(storage.len(), 3);
    }

    #[test]
    fn test_fill_all_ids_in_visitation_order() {
        let mut engine = engine_xy();
        engine.add_definition("fine").unwrap();
        engine.add_binning("fine", 0, 2, 1, 2).unwrap();
        engine.add_binning("fine", 1, 1, 1, 3).unwrap();
        let mut storage = MemoryStorage::new();

        let filled = engine.fill_all("fine", &mut storage).unwrap();
        assert_eq!(filled, 6);

        // Row-major enumeration: y selections cycle fastest, ids ascend in
        // visitation order.
        let def = engine.definition("fine").unwrap();
        let ids = def.ids().to_vec();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(
            def.coord_of(ids[0]).unwrap().components(),
            [2, 1, 1, 1, 1, 1]
        );
        assert_eq!(
            def.coord_of(ids[1]).unwrap().components(),
            [2, 1, 1, 1, 1, 2]
        );
        assert_eq!(
            def.coord_of(ids[3]).unwrap().components(),
            [2, 1, 2, 1, 1, 1]
        );
    }

    #[test]
    fn test_axis_range_in_base_rejects_out_of_axis_groups() {
        let engine = engine_one_axis(4);
        assert!(matches!(
            engine.axis_range_in_base(0, &[2, 1, 3]),
            Err(Error::InvalidBinning(_))
        ));
        assert!(matches!(
            engine.axis_range_in_base(0, &[1, 2]),
            Err(Error::InvalidBinning(_))
        ));
    }

    #[test]
    fn test_rule_change_clears_derived_state() {
        let mut engine = engine_one_axis(6);
        let mut storage = MemoryStorage::new();
        engine.fill_all("d", &mut storage).unwrap();
        assert_eq!(engine.definition("d").unwrap().ids().len(), 1);

        engine.add_binning("d", 0, 3, 1, 2).unwrap();
        let def = engine.definition("d").unwrap();
        assert!(def.ids().is_empty());
        assert!(def.content().is_empty());
    }

    #[test]
    fn test_fix_axis_pins_user_position() {
        let mut engine = engine_xy();
        let mut storage = MemoryStorage::new();
        engine.add_definition("pinned").unwrap();
        engine.add_binning("pinned", 0, 2, 1, 2).unwrap();
        engine.fix_axis("pinned", 1, 7).unwrap();

        assert_eq!(engine.fill_all("pinned", &mut storage).unwrap(), 2);
        let def = engine.definition("pinned").unwrap();
        let (coord, _) = def.content().iter().next().unwrap();
        // The fixed y position is carried verbatim as the last component.
        assert_eq!(coord.components(), [2, 1, 1, 7]);
        assert!(matches!(
            def.rule(1).unwrap(),
            AxisRule::UserFixed { position: 7 }
        ));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut engine = engine_one_axis(4);
        assert!(matches!(
            engine.add_definition("d"),
            Err(Error::InvalidBinning(_))
        ));
    }
}
