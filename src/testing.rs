//! Shared test fixtures.
//!
//! Available to both unit tests and integration tests. The canonical small
//! scenario is a 4-bin `x` axis crossed with a 3-bin `y` axis.

use crate::axis::Axis;
use crate::binning::BinningEngine;
use crate::storage::MemoryStorage;

/// Engine over `x` (4 elementary bins) and `y` (3 elementary bins).
pub fn engine_xy() -> BinningEngine {
    let mut engine = BinningEngine::new();
    engine.add_axis(Axis::numeric("x", 4, 0.0, 4.0).expect("valid axis"));
    engine.add_axis(Axis::numeric("y", 3, 0.0, 3.0).expect("valid axis"));
    engine
}

/// Add a definition grouping `x` into `n_x` equal runs (leaving `y` single),
/// fill its content space, and return the number of filled cells.
///
/// `n_x` must divide the 4-bin `x` axis (1, 2, or 4).
pub fn filled_definition(
    engine: &mut BinningEngine,
    storage: &mut MemoryStorage,
    name: &str,
    n_x: i64,
) -> usize {
    assert!(4 % n_x == 0, "n_x must divide the 4-bin x axis");
    engine.add_definition(name).expect("fresh definition name");
    engine
        .add_binning(name, 0, 4 / n_x, 1, n_x)
        .expect("valid grouping");
    engine.fill_all(name, storage).expect("fill succeeds")
}
