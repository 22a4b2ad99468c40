//! Cross-contest orchestration.
//!
//! Contests share no mutable state, so each one runs on its own rayon
//! worker. A contest is committed as a unit or not at all; a failure or
//! panic is reported against that contest and never affects the others.

use super::contest::{Component, ContestFailure, ContestPipeline};
use crate::commit::ResultSink;
use crate::config::{AnalyticsConfig, BatchConfig, SuspectPolicy};
use crate::error::{AnalyticsError, ConfigurationError};
use crate::models::ContestInput;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancels contests that have not started yet.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a batch, in input order within each list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: Vec<String>,
    pub failed: Vec<ContestFailure>,
    /// Not committed because the suspect policy is `Skip`
    pub skipped_suspect: Vec<String>,
    pub cancelled: Vec<String>,
    /// Suspect interval rows across processed and skipped contests
    pub suspect_rows: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len() + self.skipped_suspect.len() + self.cancelled.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped_suspect.is_empty() && self.cancelled.is_empty()
    }
}

enum ContestOutcome {
    Committed { contest_id: String, suspect_rows: usize },
    SkippedSuspect { contest_id: String, suspect_rows: usize },
    Failed(ContestFailure),
    Cancelled(String),
}

pub struct BatchRunner {
    pipeline: ContestPipeline,
    batch: BatchConfig,
}

impl BatchRunner {
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let batch = config.batch.clone();
        Ok(Self { pipeline: ContestPipeline::new(config)?, batch })
    }

    pub fn pipeline(&self) -> &ContestPipeline {
        &self.pipeline
    }

    /// Process every contest on a bounded pool and commit each through `sink`.
    pub fn run(
        &self,
        inputs: &[ContestInput],
        sink: &dyn ResultSink,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, AnalyticsError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.batch.workers)
            .build()
            .map_err(|e| ConfigurationError::WorkerPool(e.to_string()))?;

        log::info!("Processing {} contests on {} workers", inputs.len(), pool.current_num_threads());
        let outcomes: Vec<ContestOutcome> =
            pool.install(|| inputs.par_iter().map(|input| self.process(input, sink, cancel)).collect());

        let mut summary = BatchSummary::default();
        for outcome in outcomes {
            match outcome {
                ContestOutcome::Committed { contest_id, suspect_rows } => {
                    summary.suspect_rows += suspect_rows;
                    summary.processed.push(contest_id);
                }
                ContestOutcome::SkippedSuspect { contest_id, suspect_rows } => {
                    summary.suspect_rows += suspect_rows;
                    summary.skipped_suspect.push(contest_id);
                }
                ContestOutcome::Failed(failure) => summary.failed.push(failure),
                ContestOutcome::Cancelled(contest_id) => summary.cancelled.push(contest_id),
            }
        }

        log::info!(
            "Batch finished: {} processed, {} failed, {} skipped for suspect data, {} cancelled",
            summary.processed.len(),
            summary.failed.len(),
            summary.skipped_suspect.len(),
            summary.cancelled.len()
        );
        Ok(summary)
    }

    fn process(&self, input: &ContestInput, sink: &dyn ResultSink, cancel: &CancellationToken) -> ContestOutcome {
        let contest_id = input.contest_id().to_string();
        if cancel.is_cancelled() {
            log::debug!("Contest {} cancelled before start", contest_id);
            return ContestOutcome::Cancelled(contest_id);
        }

        let attempts = self.batch.max_attempts.max(1);
        let mut last_failure = None;
        for attempt in 1..=attempts {
            let outcome = catch_unwind(AssertUnwindSafe(|| self.attempt(input, sink)))
                .unwrap_or_else(|payload| {
                    Err((ContestFailure::new(&contest_id, Component::Worker, panic_message(payload)), true))
                });

            match outcome {
                Ok(done) => return done,
                Err((failure, retryable)) => {
                    log::warn!("Attempt {}/{} failed: {}", attempt, attempts, failure);
                    last_failure = Some(failure);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        ContestOutcome::Failed(
            last_failure.unwrap_or_else(|| ContestFailure::new(&contest_id, Component::Worker, "no attempt made")),
        )
    }

    /// One run-and-commit attempt; the flag says whether a retry may help.
    fn attempt(&self, input: &ContestInput, sink: &dyn ResultSink) -> Result<ContestOutcome, (ContestFailure, bool)> {
        let output = self.pipeline.run(input).map_err(|failure| {
            let retryable = failure.component != Component::Input;
            (failure, retryable)
        })?;
        let suspect_rows = output.suspect_rows();
        let contest_id = output.contest_id.clone();

        if suspect_rows > 0 && self.batch.suspect_policy == SuspectPolicy::Skip {
            log::warn!("Contest {} has {} suspect rows, not committing", contest_id, suspect_rows);
            return Ok(ContestOutcome::SkippedSuspect { contest_id, suspect_rows });
        }

        sink.commit(&output).map_err(|err| {
            let retryable = err.is_recoverable();
            (ContestFailure::new(&contest_id, Component::Commit, err), retryable)
        })?;
        Ok(ContestOutcome::Committed { contest_id, suspect_rows })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {}", msg)
    } else {
        "panic".to_string()
    }
}
