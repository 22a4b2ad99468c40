//! Lineup identity, stints and possession attribution.

pub mod hash;
pub mod possession;
pub mod stint;
pub mod tracker;

pub use hash::{lineup_hash, Lineup, LINEUP_SIZE};
pub use possession::{EventFrame, ExplicitChangeModel, FixedBucketModel, PossessionModel};
pub use stint::{Score, StintTracker};
pub use tracker::{track_contest, LineupOutcome, LineupTracker};
