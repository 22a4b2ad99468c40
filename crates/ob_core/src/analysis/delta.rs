//! # Delta Engine
//!
//! Turns cumulative snapshots into interval-only stat lines.
//!
//! For a window `[start, end)` the baseline `S0` is the latest snapshot at or
//! before `start` and the closing snapshot `S1` is the latest at or before
//! `end`; the interval line is `S1 - S0`. An event stamped exactly on a
//! boundary therefore counts toward the window that ends there, which keeps
//! adjacent windows tiling without overlap.

use super::advanced_stats::AdvancedStatsCalculator;
use super::partition::IntervalWindow;
use crate::error::{DataQualityWarning, ValidationError};
use crate::models::{GameClock, IntervalStat, StatLine};
use crate::store::SnapshotStore;

pub struct DeltaEngine<'a> {
    store: &'a SnapshotStore,
    contest_id: &'a str,
    calc: &'a AdvancedStatsCalculator,
}

impl<'a> DeltaEngine<'a> {
    pub fn new(store: &'a SnapshotStore, contest_id: &'a str, calc: &'a AdvancedStatsCalculator) -> Self {
        Self { store, contest_id, calc }
    }

    /// Interval stat line for `entity_id` over `window`.
    ///
    /// Metrics are the individual ones; team-relative metrics are filled in
    /// later with [`IntervalStat::apply_context`]. Quiet windows are returned,
    /// not dropped.
    pub fn delta(&self, entity_id: &str, window: &IntervalWindow) -> Result<IntervalStat, ValidationError> {
        let (line, suspect, missing_baseline) = self.raw_delta(entity_id, window.start, window.end)?;

        let team_id = self
            .store
            .snapshots_for(self.contest_id, entity_id)
            .next()
            .map(|s| (s.team_id.clone(), s.entity_kind));
        let Some((team_id, entity_kind)) = team_id else {
            return Err(self.unknown(entity_id));
        };

        Ok(IntervalStat {
            contest_id: self.contest_id.to_string(),
            entity_id: entity_id.to_string(),
            entity_kind,
            team_id,
            window: window.clone(),
            metrics: self.calc.individual(&line),
            line,
            suspect,
            missing_baseline,
            career: None,
        })
    }

    /// `(line, suspect, missing_baseline)` between two clocks.
    pub fn raw_delta(
        &self,
        entity_id: &str,
        start: GameClock,
        end: GameClock,
    ) -> Result<(StatLine, bool, bool), ValidationError> {
        if !self.store.has_entity(self.contest_id, entity_id) {
            return Err(self.unknown(entity_id));
        }
        if end < start {
            return Err(ValidationError::MalformedWindow {
                start_ticks: start.ticks(),
                end_ticks: end.ticks(),
            });
        }

        let s0 = self.store.latest_at_or_before(self.contest_id, entity_id, start);
        let Some(s1) = self.store.latest_at_or_before(self.contest_id, entity_id, end) else {
            // Entity has not appeared yet
            return Ok((StatLine::default(), false, false));
        };

        let missing_baseline = s0.is_none() && start > GameClock::ZERO;
        let zero = StatLine::default();
        let baseline = match s0 {
            Some(s0) if s0.event_number == s1.event_number => return Ok((zero, false, false)),
            Some(s0) => &s0.stats,
            None => &zero,
        };

        let (line, clamped) = StatLine::checked_delta(&s1.stats, baseline);
        if clamped {
            log::warn!(
                "{:?}: {} in contest {} over [{}, {})",
                DataQualityWarning::NegativeDeltaClamped,
                entity_id,
                self.contest_id,
                start,
                end
            );
        }
        Ok((line, clamped, missing_baseline))
    }

    fn unknown(&self, entity_id: &str) -> ValidationError {
        ValidationError::UnknownEntity {
            contest_id: self.contest_id.to_string(),
            entity_id: entity_id.to_string(),
        }
    }
}
