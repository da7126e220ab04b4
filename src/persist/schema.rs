//! Schema types for engine serialization.
//!
//! Schema types are a stable format separate from the runtime types, so the
//! two can evolve independently and deserialization can validate. Each
//! entity has an explicit, hand-written schema; there is no runtime type
//! registry. All maps are `BTreeMap` for deterministic JSON output.
//!
//! The map space is deliberately absent: it is transient registration state,
//! rebuilt from the collapsed grouped runs on load. Content spaces are
//! likewise derived from the persisted cell arenas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Axis payload: numeric edges or categorical labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxisKindSchema {
    /// Numeric axis: `n + 1` ascending edges for `n` bins.
    Numeric { edges: Vec<f64> },
    /// Categorical axis: one label per bin.
    Categorical { labels: Vec<String> },
}

/// One axis descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisSchema {
    /// Axis name.
    pub name: String,
    /// Bin description.
    pub kind: AxisKindSchema,
}

/// One grouped run `(stride, offset, bin)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupedRunSchema {
    pub stride: i64,
    pub offset: i64,
    pub bin: i64,
}

/// One axis rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxisRuleSchema {
    /// Whole axis at one stored position.
    Single { position: i64 },
    /// Partitioned into grouped runs.
    Grouped { runs: Vec<GroupedRunSchema> },
    /// User-managed single position.
    UserFixed { position: i64 },
}

/// One binning definition. The name is the key in [`EngineSchema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSchema {
    /// One rule per axis, in axis declaration order.
    pub rules: Vec<AxisRuleSchema>,
    /// Ordered accepted id list.
    pub ids: Vec<i64>,
    /// Cell arena: content id -> reduced coordinate components.
    pub cells: BTreeMap<i64, Vec<i64>>,
}

/// A whole binning engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSchema {
    /// Schema version for migration.
    pub version: u32,
    /// Axes in declaration order.
    pub axes: Vec<AxisSchema>,
    /// Definitions keyed by name.
    pub definitions: BTreeMap<String, DefinitionSchema>,
}
