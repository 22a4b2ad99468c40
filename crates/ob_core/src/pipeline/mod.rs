//! Per-contest processing and batch orchestration.

pub mod batch;
pub mod contest;

pub use batch::{BatchRunner, BatchSummary, CancellationToken};
pub use contest::{Component, ContestFailure, ContestPipeline};
