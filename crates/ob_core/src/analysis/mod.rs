//! Interval analytics: partitioning, deltas and derived metrics.

pub mod advanced_stats;
pub mod age;
pub mod delta;
pub mod partition;

pub use advanced_stats::{AdvancedStatsCalculator, DerivedMetrics, FourFactors, TeamContext};
pub use age::{age_at, career_features, nba_experience_at, AgeResult, CareerFeatures, ExperienceResult};
pub use delta::DeltaEngine;
pub use partition::{
    full_contest, played_periods, ClockRange, Granularity, IntervalPartitioner, IntervalWindow, PlayedPeriod,
};
