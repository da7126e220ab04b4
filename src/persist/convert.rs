//! Conversion between runtime types and schema types.
//!
//! Runtime -> schema conversions are lossless `From` impls. Schema ->
//! runtime conversions are `TryFrom` and re-validate through the normal
//! constructors, so a hand-edited or corrupted file cannot smuggle in an
//! invalid axis or a rule set of the wrong arity.

use std::collections::BTreeMap;

use crate::axis::{Axis, AxisKind};
use crate::binning::{
    AxisRule, BinningDefinition, BinningEngine, GroupedRun, MapSpace, ReducedCoord,
};
use crate::error::{Error, Result};

use super::schema::{
    AxisKindSchema, AxisRuleSchema, AxisSchema, DefinitionSchema, EngineSchema, GroupedRunSchema,
    SCHEMA_VERSION,
};

// =============================================================================
// Axis conversions
// =============================================================================

impl From<&Axis> for AxisSchema {
    fn from(axis: &Axis) -> Self {
        let kind = match axis.kind() {
            AxisKind::Numeric { edges } => AxisKindSchema::Numeric { edges: edges.to_vec() },
            AxisKind::Categorical { labels } => {
                AxisKindSchema::Categorical { labels: labels.to_vec() }
            }
        };
        Self { name: axis.name().to_string(), kind }
    }
}

impl TryFrom<AxisSchema> for Axis {
    type Error = Error;

    fn try_from(schema: AxisSchema) -> Result<Self> {
        match schema.kind {
            AxisKindSchema::Numeric { edges } => Axis::with_edges(schema.name, edges),
            AxisKindSchema::Categorical { labels } => Axis::categorical(schema.name, labels),
        }
    }
}

// =============================================================================
// Rule conversions
// =============================================================================

impl From<&GroupedRun> for GroupedRunSchema {
    fn from(run: &GroupedRun) -> Self {
        Self { stride: run.stride, offset: run.offset, bin: run.bin }
    }
}

impl From<GroupedRunSchema> for GroupedRun {
    fn from(schema: GroupedRunSchema) -> Self {
        Self { stride: schema.stride, offset: schema.offset, bin: schema.bin }
    }
}

impl From<&AxisRule> for AxisRuleSchema {
    fn from(rule: &AxisRule) -> Self {
        match rule {
            AxisRule::Single { position } => Self::Single { position: *position },
            AxisRule::Grouped { runs } => {
                Self::Grouped { runs: runs.iter().map(Into::into).collect() }
            }
            AxisRule::UserFixed { position } => Self::UserFixed { position: *position },
        }
    }
}

impl From<AxisRuleSchema> for AxisRule {
    fn from(schema: AxisRuleSchema) -> Self {
        match schema {
            AxisRuleSchema::Single { position } => Self::Single { position },
            AxisRuleSchema::Grouped { runs } => {
                Self::Grouped { runs: runs.into_iter().map(Into::into).collect() }
            }
            AxisRuleSchema::UserFixed { position } => Self::UserFixed { position },
        }
    }
}

// =============================================================================
// Definition conversions
// =============================================================================

impl From<&BinningDefinition> for DefinitionSchema {
    fn from(def: &BinningDefinition) -> Self {
        Self {
            rules: def.rules().iter().map(Into::into).collect(),
            ids: def.ids().to_vec(),
            cells: def
                .cells()
                .iter()
                .map(|(&id, coord)| (id, coord.components().to_vec()))
                .collect(),
        }
    }
}

fn definition_from_schema(name: String, schema: DefinitionSchema) -> BinningDefinition {
    let rules: Vec<AxisRule> = schema.rules.into_iter().map(Into::into).collect();

    // The map space is transient: rebuild it from the collapsed runs so
    // further registrations compose with the loaded state.
    let mut map_space = MapSpace::new();
    for (axis, rule) in rules.iter().enumerate() {
        if let AxisRule::Grouped { runs } = rule {
            for run in runs {
                map_space.insert(axis, run.stride, run.offset, run.bin);
            }
        }
    }

    let cells: BTreeMap<i64, ReducedCoord> = schema
        .cells
        .into_iter()
        .map(|(id, components)| (id, ReducedCoord::new(components)))
        .collect();

    BinningDefinition::restore(name, rules, schema.ids, cells, map_space)
}

// =============================================================================
// Engine conversions
// =============================================================================

impl From<&BinningEngine> for EngineSchema {
    fn from(engine: &BinningEngine) -> Self {
        Self {
            version: SCHEMA_VERSION,
            axes: engine.axes().iter().map(Into::into).collect(),
            definitions: engine
                .definition_names()
                .iter()
                .map(|&name| {
                    let def = engine.definition(name).expect("name listed by engine");
                    (name.to_string(), def.into())
                })
                .collect(),
        }
    }
}

impl TryFrom<EngineSchema> for BinningEngine {
    type Error = Error;

    fn try_from(schema: EngineSchema) -> Result<Self> {
        if schema.version != SCHEMA_VERSION {
            return Err(Error::InvalidBinning(format!(
                "unsupported schema version {}, expected {SCHEMA_VERSION}",
                schema.version
            )));
        }

        let axes: Vec<Axis> = schema
            .axes
            .into_iter()
            .map(Axis::try_from)
            .collect::<Result<_>>()?;
        let n_axes = axes.len();
        let mut engine = BinningEngine::with_axes(axes);

        for (name, def_schema) in schema.definitions {
            if def_schema.rules.len() != n_axes {
                return Err(Error::InvalidBinning(format!(
                    "definition '{name}' rules {} axes, engine has {n_axes}",
                    def_schema.rules.len()
                )));
            }
            engine.restore_definition(definition_from_schema(name, def_schema));
        }
        Ok(engine)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::storage::MemoryStorage;
    use crate::testing::{engine_xy, filled_definition};

    use super::*;

    #[test]
    fn test_engine_round_trip_preserves_state() {
        let mut engine = engine_xy();
        let mut storage = MemoryStorage::new();
        filled_definition(&mut engine, &mut storage, "coarse", 2);

        let schema = EngineSchema::from(&engine);
        let json = serde_json::to_string_pretty(&schema).unwrap();
        let back: EngineSchema = serde_json::from_str(&json).unwrap();
        let restored = BinningEngine::try_from(back).unwrap();

        assert_eq!(restored.n_axes(), 2);
        assert_eq!(restored.axis(0).unwrap().name(), "x");

        let original = engine.definition("coarse").unwrap();
        let loaded = restored.definition("coarse").unwrap();
        assert_eq!(loaded.rules(), original.rules());
        assert_eq!(loaded.ids(), original.ids());
        assert_eq!(loaded.content(), original.content());
    }

    #[test]
    fn test_loaded_engine_accepts_further_registrations() {
        let mut engine = engine_xy();
        let mut storage = MemoryStorage::new();
        filled_definition(&mut engine, &mut storage, "coarse", 2);

        let schema = EngineSchema::from(&engine);
        let mut restored = BinningEngine::try_from(schema).unwrap();

        // The rebuilt map space composes with new registrations: adding the
        // same runs again is a no-op, finer runs extend the rule.
        restored.add_binning("coarse", 0, 2, 1, 2).unwrap();
        restored.add_binning("coarse", 1, 1, 1, 3).unwrap();
        let mut storage = MemoryStorage::new();
        assert_eq!(restored.fill_all("coarse", &mut storage).unwrap(), 6);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let schema = EngineSchema {
            version: 99,
            axes: vec![],
            definitions: BTreeMap::new(),
        };
        assert!(matches!(
            BinningEngine::try_from(schema),
            Err(Error::InvalidBinning(_))
        ));
    }

    #[test]
    fn test_corrupt_axis_rejected_on_load() {
        let schema = EngineSchema {
            version: SCHEMA_VERSION,
            axes: vec![AxisSchema {
                name: "bad".into(),
                kind: AxisKindSchema::Numeric { edges: vec![1.0, 0.5] },
            }],
            definitions: BTreeMap::new(),
        };
        assert!(matches!(
            BinningEngine::try_from(schema),
            Err(Error::InvalidAxis(_))
        ));
    }

    #[test]
    fn test_rule_arity_mismatch_rejected() {
        let mut engine = engine_xy();
        let mut storage = MemoryStorage::new();
        filled_definition(&mut engine, &mut storage, "coarse", 2);

        let mut schema = EngineSchema::from(&engine);
        schema.axes.pop();
        assert!(matches!(
            BinningEngine::try_from(schema),
            Err(Error::InvalidBinning(_))
        ));
    }
}
