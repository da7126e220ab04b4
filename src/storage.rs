//! Dataset storage collaborators.
//!
//! The core treats storage as an opaque collaborator: `get` resolves an
//! entry id to a record, `put` stores a record and allocates its id. No
//! on-disk format is mandated. [`MemoryStorage`] is the deterministic
//! in-memory implementation used by tests and as the cloneable backing for
//! worker contexts.

use std::collections::BTreeMap;

use ndarray::{ArrayD, IxDyn};

use crate::binning::ReducedCoord;

// =============================================================================
// Record
// =============================================================================

/// One stored entry: a labeled n-dimensional payload plus provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Human-readable label.
    pub label: String,
    /// Measurement payload.
    pub payload: ArrayD<f64>,
    /// Reduced bin this record belongs to, if any.
    pub reduced: Option<ReducedCoord>,
    /// Entry id of the point that produced this record, if any.
    pub origin: Option<i64>,
}

impl Record {
    /// Create a record with just a label and payload.
    pub fn new(label: impl Into<String>, payload: ArrayD<f64>) -> Self {
        Self {
            label: label.into(),
            payload,
            reduced: None,
            origin: None,
        }
    }

    /// Empty seed record occupying one freshly filled content cell.
    pub fn seed(definition: &str, coord: &ReducedCoord) -> Self {
        Self {
            label: format!("{definition}{coord}"),
            payload: ArrayD::zeros(IxDyn(&[0])),
            reduced: Some(coord.clone()),
            origin: None,
        }
    }
}

// =============================================================================
// DatasetStorage
// =============================================================================

/// Opaque storage collaborator resolving entry ids to records.
pub trait DatasetStorage {
    /// Record stored under `entry_id`, if any.
    fn get(&self, entry_id: i64) -> Option<&Record>;

    /// Store a record and return its freshly allocated entry id.
    fn put(&mut self, record: Record) -> i64;

    /// Number of stored records.
    fn len(&self) -> usize;

    /// Check if no record is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// Deterministic in-memory storage. Ids start at 1 and ascend.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    records: BTreeMap<i64, Record>,
    next_id: i64,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self { records: BTreeMap::new(), next_id: 1 }
    }

    /// Stored records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Record)> {
        self.records.iter().map(|(&id, rec)| (id, rec))
    }
}

impl DatasetStorage for MemoryStorage {
    fn get(&self, entry_id: i64) -> Option<&Record> {
        self.records.get(&entry_id)
    }

    fn put(&mut self, record: Record) -> i64 {
        // A default-constructed storage starts allocating at 1 as well.
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, record);
        id
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
