//! Per-thread worker state and the deterministic merge protocol.
//!
//! A [`WorkerContext`] is created at pool start with a private snapshot of
//! the definition's pending ids and a private deep clone of the storage, so
//! workers never contend during dispatch. Artifacts a worker produces are
//! tagged with their origin entry id and per-point sequence; after the pool
//! is joined the orchestrator folds all contexts back in `(origin, seq)`
//! order, which is stable regardless of queue scheduling.

use crate::binning::ReducedCoord;
use crate::storage::Record;

// =============================================================================
// Point
// =============================================================================

/// One reduced bin handed to the analysis callback.
#[derive(Clone, Debug)]
pub struct Point {
    /// Elementary entry id being processed.
    pub entry_id: i64,
    /// Reduced coordinate of the bin.
    pub reduced: ReducedCoord,
    /// Per-axis elementary bin range `[min, max]` the bin covers.
    pub base_ranges: Vec<(i64, i64)>,
    /// Elementary anchor: the low end of each axis range.
    pub anchor: Vec<i64>,
}

// =============================================================================
// OutputSink
// =============================================================================

/// Ordered artifact collector handed to the callback.
///
/// Appending zero artifacts to the per-point sink is the explicit "nothing
/// to record for this bin" signal: the entry id is then not re-accepted.
#[derive(Debug, Default)]
pub struct OutputSink {
    artifacts: Vec<Record>,
}

impl OutputSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one artifact.
    pub fn push(&mut self, record: Record) {
        self.artifacts.push(record);
    }

    /// Number of collected artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Drain artifacts appended after position `from`.
    pub(crate) fn drain_from(&mut self, from: usize) -> Vec<Record> {
        self.artifacts.split_off(from)
    }
}

// =============================================================================
// WorkerContext
// =============================================================================

/// Artifact captured during a pass, with its deterministic merge key.
#[derive(Clone, Debug)]
pub(crate) struct CreatedRecord {
    /// Entry id of the point that produced the artifact.
    pub origin: i64,
    /// True for global-sink artifacts, false for per-point ones.
    pub global: bool,
    /// Sequence within the point's sink.
    pub seq: usize,
    pub record: Record,
}

impl CreatedRecord {
    fn key(&self) -> (i64, bool, usize) {
        (self.origin, self.global, self.seq)
    }
}

/// Per-thread isolated processing state for one parallel pass.
#[derive(Debug)]
pub struct WorkerContext<S> {
    worker_index: usize,
    /// Private snapshot of the definition's pending ids.
    pending: Vec<i64>,
    /// Ids whose callback produced at least one per-point artifact.
    accepted: Vec<i64>,
    /// Artifacts captured by this worker, pending merge.
    created: Vec<CreatedRecord>,
    /// Private deep clone of the canonical storage.
    storage: S,
    /// This worker's shard of the global output.
    global: OutputSink,
}

impl<S> WorkerContext<S> {
    /// Create a context bound to one worker thread.
    pub fn new(worker_index: usize, pending: Vec<i64>, storage: S) -> Self {
        Self {
            worker_index,
            pending,
            accepted: Vec::new(),
            created: Vec::new(),
            storage,
            global: OutputSink::new(),
        }
    }

    /// Index of the worker thread this context is bound to.
    #[inline]
    pub fn worker_index(&self) -> usize {
        self.worker_index
    }

    /// Snapshot of the pending ids this pass was started with.
    #[inline]
    pub fn pending(&self) -> &[i64] {
        &self.pending
    }

    /// Check if an id belongs to this pass's pending snapshot.
    pub fn is_pending(&self, id: i64) -> bool {
        self.pending.contains(&id)
    }

    /// Ids accepted so far, in this worker's processing order.
    #[inline]
    pub fn accepted(&self) -> &[i64] {
        &self.accepted
    }

    /// Private storage clone, for callback-side reads.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn global_mut(&mut self) -> &mut OutputSink {
        &mut self.global
    }

    pub(crate) fn accept(&mut self, id: i64) {
        self.accepted.push(id);
    }

    pub(crate) fn record_point_artifacts(&mut self, origin: i64, artifacts: Vec<Record>) {
        for (seq, mut record) in artifacts.into_iter().enumerate() {
            record.origin = Some(origin);
            self.created.push(CreatedRecord { origin, global: false, seq, record });
        }
    }

    pub(crate) fn record_global_artifacts(&mut self, origin: i64, artifacts: Vec<Record>) {
        for (seq, mut record) in artifacts.into_iter().enumerate() {
            record.origin = Some(origin);
            self.created.push(CreatedRecord { origin, global: true, seq, record });
        }
    }
}

/// Fold worker contexts back into one deterministic result: the union of
/// accepted ids (sorted) and all created records in `(origin, global, seq)`
/// order.
pub(crate) fn fold_contexts<S>(contexts: Vec<WorkerContext<S>>) -> (Vec<i64>, Vec<CreatedRecord>) {
    let mut accepted = Vec::new();
    let mut created = Vec::new();
    for context in contexts {
        accepted.extend_from_slice(&context.accepted);
        created.extend(context.created);
    }
    accepted.sort_unstable();
    created.sort_by_key(CreatedRecord::key);
    (accepted, created)
}
