//! # ob_core - Temporal Snapshot Interval Analytics Engine
//!
//! Turns cumulative per-event basketball box-score snapshots into
//! interval-only statistics, lineup and stint records, and possession
//! attribution, at granularities from whole games down to tenths of a second.
//!
//! ## Features
//! - Exact window arithmetic on a decisecond clock
//! - Nearest-preceding snapshot lookups by binary search
//! - Order-independent lineup hashes, stints with plus-minus
//! - Per-contest atomic commits; contests run in parallel

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::too_many_arguments)]

pub mod analysis;
pub mod commit;
pub mod config;
pub mod error;
pub mod lineup;
pub mod models;
pub mod pipeline;
pub mod store;

pub use analysis::{
    AdvancedStatsCalculator, ClockRange, DeltaEngine, DerivedMetrics, Granularity, IntervalPartitioner,
    IntervalWindow, TeamContext,
};
pub use commit::{CommitError, ContestOutput, FileSink, MemorySink, ResultSink};
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, ConfigurationError, DataQualityWarning, Result, ValidationError};
pub use lineup::{lineup_hash, Lineup, LineupTracker, PossessionModel};
pub use models::{
    ContestInput, ContestMeta, EntityKind, GameClock, IntervalStat, LineupSnapshot, PlayerBio, Possession,
    Snapshot, StatLine, Stint,
};
pub use pipeline::{BatchRunner, BatchSummary, CancellationToken, ContestFailure, ContestPipeline};
pub use store::SnapshotStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_pipeline_builds() {
        let pipeline = ContestPipeline::new(AnalyticsConfig::from_env_or_default()).unwrap();
        assert_eq!(pipeline.rejected_ranges(), 0);
    }
}
