//! The binning engine and its supporting types.
//!
//! - [`rule`] - Per-axis rebinning rules (`Single`, `Grouped`, `UserFixed`)
//! - [`map_space`] - Transient registration space for grouped runs
//! - [`content`] - Reduced coordinates and the sparse content space
//! - [`definition`] - Named rule assignments with accepted-id lists
//! - [`engine`] - The axis-owning engine tying it all together

pub mod content;
pub mod definition;
pub mod engine;
pub mod map_space;
pub mod rule;

pub use content::{ContentSpace, ReducedCoord};
pub use definition::BinningDefinition;
pub use engine::BinningEngine;
pub use map_space::MapSpace;
pub use rule::{AxisRule, GroupedRun};
