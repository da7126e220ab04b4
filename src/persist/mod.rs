//! Explicit engine serialization.
//!
//! - [`schema`] - Stable schema types, serde-derived
//! - [`convert`] - `From`/`TryFrom` between runtime and schema types
//!
//! Serialize `EngineSchema::from(&engine)` with any serde format; load with
//! `BinningEngine::try_from(schema)`, which re-validates everything.

pub mod convert;
pub mod schema;

pub use schema::{
    AxisKindSchema, AxisRuleSchema, AxisSchema, DefinitionSchema, EngineSchema, GroupedRunSchema,
    SCHEMA_VERSION,
};
