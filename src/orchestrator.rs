//! The processing orchestrator.
//!
//! Sequences named binning definitions through the grid executor, invoking
//! the analysis callback once per pending elementary entry and folding the
//! results back into the canonical engine and storage. Definitions are
//! processed strictly in caller-supplied order; an id claimed by an earlier
//! definition is filtered from every later one, so no id is processed twice
//! in one run.

use std::collections::BTreeSet;

use bon::Builder;

use crate::binning::BinningEngine;
use crate::error::{Error, Result};
use crate::executor::GridExecutor;
use crate::logger::{RunLogger, Verbosity};
use crate::storage::DatasetStorage;
use crate::worker::{fold_contexts, OutputSink, Point, WorkerContext};

// =============================================================================
// RunOptions
// =============================================================================

/// Sequential or thread-pool execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One callback invocation at a time on the calling thread.
    #[default]
    Sequential,
    /// Fixed pool of `n_workers` threads, sized once per run.
    Parallel { n_workers: usize },
}

/// Options for one orchestrator run.
#[derive(Clone, Debug, Default, Builder)]
pub struct RunOptions {
    /// Execution mode. Default: sequential.
    #[builder(default)]
    pub mode: ExecutionMode,
    /// Verbosity level. Default: silent.
    #[builder(default)]
    pub verbosity: Verbosity,
}

// =============================================================================
// RunReport
// =============================================================================

/// Outcome of one definition pass.
#[derive(Clone, Debug)]
pub struct DefinitionReport {
    /// Definition name.
    pub name: String,
    /// Pending entries handed to the callback.
    pub processed: usize,
    /// Entries whose callback produced at least one per-point artifact.
    pub accepted: usize,
    /// Entries dropped by the cross-definition claim filter.
    pub skipped: usize,
}

/// Outcome of a whole orchestrator run.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    /// One report per processed definition, in run order.
    pub definitions: Vec<DefinitionReport>,
    /// Total artifacts merged into the canonical storage.
    pub n_artifacts: usize,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives definitions through the executor and merges results back.
#[derive(Clone, Debug, Default)]
pub struct Orchestrator {
    options: RunOptions,
}

impl Orchestrator {
    /// Create an orchestrator with the given run options.
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Run options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Process the named definitions in order.
    ///
    /// Per definition: pending ids are the definition's id list minus
    /// everything claimed earlier in this run; the callback runs once per
    /// pending id over a degenerate 1-D index space; entries whose callback
    /// recorded at least one per-point artifact are re-accepted. The
    /// definition's id list and content space are committed only after its
    /// whole pass succeeded, so a callback error aborts the run without
    /// partial commit; definitions committed earlier stay valid.
    ///
    /// The `config` value is threaded unmodified into every callback
    /// invocation.
    pub fn run<S, C, F>(
        &self,
        engine: &mut BinningEngine,
        names: &[&str],
        storage: &mut S,
        config: &C,
        callback: F,
    ) -> Result<RunReport>
    where
        S: DatasetStorage + Clone + Send,
        C: Sync,
        F: Fn(&Point, &C, &mut OutputSink, &mut OutputSink, usize) -> Result<()> + Sync,
    {
        let mut logger = RunLogger::new(self.options.verbosity);
        let mode_name = match self.options.mode {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel { .. } => "parallel",
        };
        logger.start_run(names.len(), mode_name);

        let mut claimed: BTreeSet<i64> = BTreeSet::new();
        let mut report = RunReport::default();

        for &name in names {
            // Cross-definition precedence: drop ids claimed earlier in this
            // run (and duplicates within the list) before deriving bounds.
            let def = engine.definition(name)?;
            let mut seen = BTreeSet::new();
            let mut pending = Vec::new();
            let mut skipped = 0usize;
            for &id in def.ids() {
                if claimed.contains(&id) || !seen.insert(id) {
                    skipped += 1;
                } else {
                    pending.push(id);
                }
            }

            if pending.is_empty() {
                logger.log_definition(name, 0, 0, skipped);
                report.definitions.push(DefinitionReport {
                    name: name.to_string(),
                    processed: 0,
                    accepted: 0,
                    skipped,
                });
                continue;
            }

            let points = self.build_points(engine, name, &pending)?;
            let executor = GridExecutor::new(vec![0], vec![pending.len() as i64 - 1])?;

            let (accepted, created, n_contexts) = match self.options.mode {
                ExecutionMode::Sequential => {
                    let mut context = WorkerContext::new(0, pending.clone(), storage.clone());
                    executor.execute(|coord| {
                        process_point(&points[coord[0] as usize], config, &callback, &mut context)
                    })?;
                    // Sequential acceptance keeps processing order; only the
                    // parallel merge sorts.
                    let accepted = context.accepted().to_vec();
                    let (_, created) = fold_contexts(vec![context]);
                    (accepted, created, 1)
                }
                ExecutionMode::Parallel { n_workers } => {
                    let n_workers = n_workers.max(1);
                    let mut contexts: Vec<WorkerContext<S>> = (0..n_workers)
                        .map(|w| WorkerContext::new(w, pending.clone(), storage.clone()))
                        .collect();
                    executor.execute_parallel(&mut contexts, |coord, context| {
                        process_point(&points[coord[0] as usize], config, &callback, context)
                    })?;
                    let (accepted, created) = fold_contexts(contexts);
                    if accepted.is_empty() {
                        return Err(Error::MergeFailure(name.to_string()));
                    }
                    (accepted, created, n_workers)
                }
            };

            // Commit: replay accepted ids into the canonical content space,
            // then union created records into the canonical storage. This is
            // the only phase that mutates shared state, and it runs single
            // threaded after every worker has been joined.
            let def = engine.definition_mut(name)?;
            *def.ids_mut() = accepted.clone();
            def.refresh_content_from_ids()?;

            let n_created = created.len();
            for item in created {
                storage.put(item.record);
            }
            report.n_artifacts += n_created;

            claimed.extend(accepted.iter().copied());
            logger.log_definition(name, pending.len(), accepted.len(), skipped);
            logger.log_merge(name, n_contexts, n_created);
            report.definitions.push(DefinitionReport {
                name: name.to_string(),
                processed: pending.len(),
                accepted: accepted.len(),
                skipped,
            });
        }

        logger.finish_run(report.n_artifacts);
        Ok(report)
    }

    /// Resolve every pending id to the `Point` handed to the callback.
    fn build_points(
        &self,
        engine: &BinningEngine,
        name: &str,
        pending: &[i64],
    ) -> Result<Vec<Point>> {
        let spans = engine.reduced_spans(name)?;
        let def = engine.definition(name)?;

        let mut points = Vec::with_capacity(pending.len());
        for &id in pending {
            let coord = def
                .coord_of(id)
                .ok_or_else(|| {
                    Error::InvalidBinning(format!(
                        "id {id} has no cell in definition '{name}'"
                    ))
                })?
                .clone();
            let mut base_ranges = Vec::with_capacity(spans.len());
            for (axis, span) in spans.iter().enumerate() {
                let components = &coord.components()[span.clone()];
                base_ranges.push(engine.axis_range_in_base(axis, components)?);
            }
            let anchor = base_ranges.iter().map(|&(lo, _)| lo).collect();
            points.push(Point { entry_id: id, reduced: coord, base_ranges, anchor });
        }
        Ok(points)
    }
}

/// Step shared by both modes: invoke the callback for one point against one
/// context, capturing its artifacts. An empty per-point sink means "nothing
/// to record" and the entry id is not re-accepted.
fn process_point<S, C, F>(
    point: &Point,
    config: &C,
    callback: &F,
    context: &mut WorkerContext<S>,
) -> Result<()>
where
    F: Fn(&Point, &C, &mut OutputSink, &mut OutputSink, usize) -> Result<()>,
{
    // Ids outside the pending snapshot were claimed before this pass
    // started; skipping them is an idempotent no-op.
    if !context.is_pending(point.entry_id) {
        return Ok(());
    }

    let worker_index = context.worker_index();
    let mut point_sink = OutputSink::new();
    let mut global_sink = std::mem::take(context.global_mut());

    let outcome = callback(point, config, &mut global_sink, &mut point_sink, worker_index);
    *context.global_mut() = global_sink;
    outcome?;

    let globals = context.global_mut().drain_from(0);
    context.record_global_artifacts(point.entry_id, globals);

    if !point_sink.is_empty() {
        let artifacts = point_sink.drain_from(0);
        context.record_point_artifacts(point.entry_id, artifacts);
        context.accept(point.entry_id);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
