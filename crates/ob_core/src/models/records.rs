//! Output rows consumed by downstream reporting.

use super::snapshot::{EntityKind, StatLine};
use crate::analysis::advanced_stats::{AdvancedStatsCalculator, DerivedMetrics, TeamContext};
use crate::analysis::age::CareerFeatures;
use crate::analysis::partition::IntervalWindow;
use serde::{Deserialize, Serialize};

/// Interval-only stat line for one entity over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStat {
    pub contest_id: String,
    pub entity_id: String,
    pub entity_kind: EntityKind,
    pub team_id: String,
    pub window: IntervalWindow,
    /// Raw counting-stat deltas
    pub line: StatLine,
    pub metrics: DerivedMetrics,
    /// A cumulative field decreased inside the window and was clamped
    pub suspect: bool,
    /// No snapshot preceded the window start; a zero baseline was used
    pub missing_baseline: bool,
    /// Age and tenure at window start, when biographical data is known
    #[serde(default)]
    pub career: Option<CareerFeatures>,
}

impl IntervalStat {
    /// No points and no shot attempts in the window.
    pub fn is_quiet(&self) -> bool {
        self.line.is_quiet()
    }

    /// Recompute metrics with team and opponent lines for the same window.
    pub fn apply_context(&mut self, calc: &AdvancedStatsCalculator, ctx: &TeamContext) {
        self.metrics = calc.derive(&self.line, self.entity_kind, Some(ctx));
    }
}

/// A team's five-player unit at the event where it took the floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSnapshot {
    pub contest_id: String,
    pub event_number: u32,
    pub period: u8,
    pub elapsed_ticks: u32,
    pub team_id: String,
    pub lineup_hash: String,
    pub players: Vec<String>,
}

/// A contiguous on-court span for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    pub contest_id: String,
    pub player_id: String,
    pub team_id: String,
    /// Per-player, starting at 1
    pub stint_number: u32,
    pub start_event: u32,
    /// `None` while the stint is still open
    pub end_event: Option<u32>,
    pub start_ticks: u32,
    pub end_ticks: Option<u32>,
    pub points_for: u32,
    pub points_against: u32,
    pub plus_minus: i64,
}

impl Stint {
    pub fn is_open(&self) -> bool {
        self.end_event.is_none()
    }

    pub fn seconds_played(&self) -> f64 {
        match self.end_ticks {
            Some(end) => end.saturating_sub(self.start_ticks) as f64 / 10.0,
            None => 0.0,
        }
    }
}

/// How possession boundaries were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMethod {
    /// Fixed-size event buckets with alternating offense. An approximation:
    /// real possession changes depend on turnovers and the shot clock.
    FixedBucket,
    /// Boundaries taken from possession-change signals in the source.
    ExplicitChange,
}

/// One attributed possession.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Possession {
    pub contest_id: String,
    /// Starting at 1
    pub possession_number: u32,
    pub period: u8,
    pub start_event: u32,
    pub end_event: u32,
    pub offensive_team_id: String,
    pub defensive_team_id: String,
    pub offensive_lineup_hash: Option<String>,
    pub defensive_lineup_hash: Option<String>,
    pub points_scored: u32,
    /// Offensive team's running points per possession through this one
    pub running_points_per_possession: f64,
    pub method: AttributionMethod,
}
