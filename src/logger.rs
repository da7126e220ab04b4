//! Run logging.
//!
//! [`RunLogger`] prints orchestrator progress to stderr. Default verbosity
//! is silent so library users see nothing unless they ask for it.

use std::time::Instant;

// =============================================================================
// Verbosity
// =============================================================================

/// How much the orchestrator prints while running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Per-definition summaries.
    Info,
    /// Per-definition summaries plus merge details.
    Debug,
}

// =============================================================================
// RunLogger
// =============================================================================

/// Structured progress logger for orchestrator runs.
#[derive(Debug)]
pub struct RunLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
}

impl RunLogger {
    /// Create a logger at the given verbosity.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity, started: None }
    }

    /// Log the start of an orchestrator run.
    pub fn start_run(&mut self, n_definitions: usize, mode: &str) {
        self.started = Some(Instant::now());
        if self.verbosity >= Verbosity::Info {
            eprintln!("[run] {n_definitions} definition(s), {mode} mode");
        }
    }

    /// Log one processed definition.
    pub fn log_definition(&self, name: &str, processed: usize, accepted: usize, skipped: usize) {
        if self.verbosity >= Verbosity::Info {
            eprintln!(
                "[run] '{name}': processed {processed}, accepted {accepted}, skipped {skipped}"
            );
        }
    }

    /// Log merge details for one definition (debug only).
    pub fn log_merge(&self, name: &str, n_workers: usize, n_records: usize) {
        if self.verbosity >= Verbosity::Debug {
            eprintln!("[run] '{name}': merged {n_workers} worker(s), {n_records} record(s)");
        }
    }

    /// Log the end of a run.
    pub fn finish_run(&mut self, n_artifacts: usize) {
        if self.verbosity >= Verbosity::Info {
            let elapsed = self
                .started
                .take()
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0);
            eprintln!("[run] done: {n_artifacts} artifact(s) in {elapsed:.3}s");
        }
    }
}
