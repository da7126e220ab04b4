//! binfold: sparse, rebinnable grids with per-bin analysis callbacks.
//!
//! Multi-dimensional measurement data is organized on a full-resolution
//! elementary grid described by [`Axis`] descriptors. Named
//! [`BinningDefinition`]s group elementary bins into reduced (logical) bins
//! under per-axis rules, and the [`Orchestrator`] runs a user callback once
//! per reduced bin, sequentially or across a worker pool, before
//! deterministically merging per-worker results back into the canonical
//! engine and storage.
//!
//! # Key Types
//!
//! - [`Axis`] - One dimension's elementary bins (numeric or categorical)
//! - [`GridExecutor`] - Cartesian iteration, sequential and parallel
//! - [`BinningEngine`] - Axis arena, rule registration, reduced enumeration
//! - [`Orchestrator`] / [`RunOptions`] - Callback sequencing and merge
//! - [`DatasetStorage`] / [`MemoryStorage`] - Entry-id storage collaborators
//!
//! # Example
//!
//! ```
//! use binfold::{Axis, BinningEngine, MemoryStorage};
//!
//! let mut engine = BinningEngine::new();
//! engine.add_axis(Axis::numeric("x", 9, 0.0, 9.0)?);
//! engine.add_definition("coarse")?;
//! engine.add_binning_variable("coarse", 0, &[1, 4, 7, 10])?;
//!
//! let mut storage = MemoryStorage::new();
//! let filled = engine.fill_all("coarse", &mut storage)?;
//! assert_eq!(filled, 3);
//! # Ok::<(), binfold::Error>(())
//! ```

pub mod axis;
pub mod binning;
pub mod error;
pub mod executor;
pub mod logger;
pub mod orchestrator;
pub mod persist;
pub mod storage;
pub mod testing;
pub mod worker;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use axis::{Axis, AxisKind};
pub use binning::{
    AxisRule, BinningDefinition, BinningEngine, ContentSpace, GroupedRun, ReducedCoord,
};
pub use error::{Error, Result};
pub use executor::GridExecutor;
pub use logger::{RunLogger, Verbosity};
pub use orchestrator::{
    DefinitionReport, ExecutionMode, Orchestrator, RunOptions, RunReport,
};
pub use storage::{DatasetStorage, MemoryStorage, Record};
pub use worker::{OutputSink, Point, WorkerContext};
