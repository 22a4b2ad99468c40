//! # Contest Pipeline
//!
//! Runs every component over one contest and assembles its output. Nothing
//! is committed here; the caller decides what to do with the result.
//!
//! ## Flow
//! 1. Index snapshots ([`SnapshotStore`])
//! 2. Derive played periods and partition each configured granularity
//! 3. Delta every player and team per window, then apply team context
//! 4. Replay events for lineups and stints, then attribute possessions

use crate::analysis::advanced_stats::{AdvancedStatsCalculator, TeamContext};
use crate::analysis::age::career_features;
use crate::analysis::delta::DeltaEngine;
use crate::analysis::partition::{played_periods, Granularity, IntervalPartitioner, IntervalWindow};
use crate::commit::{ContestDiagnostics, ContestOutput};
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, ValidationError};
use crate::lineup::{track_contest, ExplicitChangeModel, FixedBucketModel, PossessionModel};
use crate::models::{ContestInput, ContestMeta, EntityKind, IntervalStat, StatLine};
use crate::store::SnapshotStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stage of the pipeline a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Input,
    Delta,
    Lineup,
    Possession,
    Commit,
    /// The worker panicked
    Worker,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Input => "input",
            Component::Delta => "delta",
            Component::Lineup => "lineup",
            Component::Possession => "possession",
            Component::Commit => "commit",
            Component::Worker => "worker",
        };
        f.write_str(name)
    }
}

/// A contest that produced no committed output.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("contest {contest_id} failed in {component}: {cause}")]
pub struct ContestFailure {
    pub contest_id: String,
    pub component: Component,
    pub cause: String,
}

impl ContestFailure {
    pub fn new(contest_id: &str, component: Component, cause: impl fmt::Display) -> Self {
        Self { contest_id: contest_id.to_string(), component, cause: cause.to_string() }
    }
}

pub struct ContestPipeline {
    config: AnalyticsConfig,
    partitioners: Vec<IntervalPartitioner>,
    calc: AdvancedStatsCalculator,
    rejected_ranges: usize,
}

impl ContestPipeline {
    /// Validate the configuration and build every partitioner up front.
    ///
    /// Granularity errors are returned. A malformed decisecond range only
    /// drops that range.
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;

        let mut partitioners = Vec::with_capacity(config.granularities.len() + config.decisecond_ranges.len());
        for granularity in &config.granularities {
            partitioners.push(IntervalPartitioner::new(
                config.rules.clone(),
                *granularity,
                config.max_decisecond_span_seconds,
            )?);
        }

        let mut rejected_ranges = 0;
        for range in &config.decisecond_ranges {
            match IntervalPartitioner::new(
                config.rules.clone(),
                Granularity::Deciseconds(*range),
                config.max_decisecond_span_seconds,
            ) {
                Ok(partitioner) => partitioners.push(partitioner),
                Err(AnalyticsError::Validation(err)) => {
                    log::warn!("Skipping decisecond range {:?}: {}", range, err);
                    rejected_ranges += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let calc = AdvancedStatsCalculator::new(config.metrics.clone());
        Ok(Self { config, partitioners, calc, rejected_ranges })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Decisecond ranges dropped at construction.
    pub fn rejected_ranges(&self) -> usize {
        self.rejected_ranges
    }

    pub fn run(&self, input: &ContestInput) -> Result<ContestOutput, ContestFailure> {
        let contest_id = input.contest_id().to_string();
        let Some(meta) = input.meta.as_ref() else {
            return Err(ContestFailure::new(
                &contest_id,
                Component::Input,
                ValidationError::MissingContestMeta { contest_id: contest_id.clone() },
            ));
        };

        let span = tracing::info_span!("contest", contest_id = %contest_id);
        let _guard = span.enter();

        let store = SnapshotStore::from_snapshots(
            input.snapshots.iter().filter(|s| s.contest_id == contest_id).cloned(),
        );
        let store_diag = store.diagnostics();
        let mut output = ContestOutput::new(&contest_id);
        output.diagnostics = ContestDiagnostics {
            duplicates_dropped: store_diag.duplicates_dropped,
            monotonic_violations: store_diag.monotonic_violations,
            ..Default::default()
        };

        let played = played_periods(&self.config.rules, &store.period_extents(&contest_id));
        tracing::debug!(snapshots = store.len(), periods = played.len(), "indexed contest");

        let engine = DeltaEngine::new(&store, &contest_id, &self.calc);
        for partitioner in &self.partitioners {
            for window in partitioner.partition(&played) {
                let rows = self.window_rows(&engine, &store, input, meta, &window, &mut output.diagnostics);
                output.interval_stats.extend(rows);
            }
        }
        output.diagnostics.clamped_rows = output.interval_stats.iter().filter(|s| s.suspect).count();
        output.diagnostics.missing_baseline_rows =
            output.interval_stats.iter().filter(|s| s.missing_baseline).count();

        let lineup = track_contest(&store, meta);
        output.diagnostics.invalid_lineup_events = lineup.invalid_lineup_events;
        output.diagnostics.skipped_units += lineup.invalid_lineup_events;

        let model: Box<dyn PossessionModel> =
            if self.config.possession.prefer_explicit && ExplicitChangeModel::applies_to(&lineup.frames) {
                Box::new(ExplicitChangeModel)
            } else {
                Box::new(FixedBucketModel::new(self.config.possession.bucket_size))
            };
        output.possessions = model.attribute(meta, &lineup.frames);
        output.diagnostics.possession_method = Some(model.method());
        output.lineups = lineup.lineups;
        output.stints = lineup.stints;

        tracing::info!(
            intervals = output.interval_stats.len(),
            lineups = output.lineups.len(),
            stints = output.stints.len(),
            possessions = output.possessions.len(),
            suspect = output.diagnostics.clamped_rows,
            "contest processed"
        );
        Ok(output)
    }

    /// Every entity's row for one window, with team context applied.
    fn window_rows(
        &self,
        engine: &DeltaEngine<'_>,
        store: &SnapshotStore,
        input: &ContestInput,
        meta: &ContestMeta,
        window: &IntervalWindow,
        diagnostics: &mut ContestDiagnostics,
    ) -> Vec<IntervalStat> {
        let mut rows = Vec::new();
        for kind in [EntityKind::Player, EntityKind::Team] {
            for (entity_id, _) in store.entities(&meta.contest_id, kind) {
                match engine.delta(entity_id, window) {
                    Ok(row) => rows.push(row),
                    Err(err) => {
                        log::warn!("Skipping {} over {}: {}", entity_id, window.label, err);
                        diagnostics.skipped_units += 1;
                    }
                }
            }
        }

        let home = team_line(&rows, &meta.home_team_id);
        let away = team_line(&rows, &meta.away_team_id);
        let game_minutes = window.minutes();
        let at = meta.timestamp_at(window.start);

        for row in &mut rows {
            let ctx = if row.team_id == meta.home_team_id {
                Some(TeamContext { team: home, opponent: away, game_minutes })
            } else if row.team_id == meta.away_team_id {
                Some(TeamContext { team: away, opponent: home, game_minutes })
            } else {
                None
            };
            if let Some(ctx) = ctx {
                row.apply_context(&self.calc, &ctx);
            }
            if row.entity_kind == EntityKind::Player {
                row.career = match (input.bios.get(&row.entity_id), at) {
                    (Some(bio), Some(at)) => career_features(bio, at),
                    _ => None,
                };
            }
        }
        rows
    }
}

/// The team's own row when the source has one, else the sum of its players.
fn team_line(rows: &[IntervalStat], team_id: &str) -> StatLine {
    if let Some(team) = rows.iter().find(|r| r.entity_kind == EntityKind::Team && r.entity_id == team_id) {
        return team.line;
    }
    let mut total = StatLine::default();
    for row in rows.iter().filter(|r| r.entity_kind == EntityKind::Player && r.team_id == team_id) {
        total += &row.line;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::partition::ClockRange;
    use crate::models::{AttributionMethod, PlayerBio, Snapshot};
    use crate::store::test_support::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn lineup_rows(event: u32, team: &str, prefix: &str, secs: f64, stats: StatLine) -> Vec<Snapshot> {
        (1..=5)
            .map(|i| player_snap(event, &format!("{}{}", prefix, i), team, 1, secs, stats, true))
            .collect()
    }

    fn small_contest() -> ContestInput {
        let mut rows = lineup_rows(1, "BOS", "b", 0.0, StatLine::default());
        rows.extend(lineup_rows(1, "NYK", "n", 0.0, StatLine::default()));
        let made_two = StatLine { pts: 2, fgm: 1, fga: 1, minutes: 1.0, ..Default::default() };
        rows.push(player_snap(2, "b1", "BOS", 1, 60.0, made_two, true));
        rows.push(player_snap(3, "n1", "NYK", 1, 400.0, StatLine { fga: 2, ..Default::default() }, true));
        rows.push(player_snap(4, "b1", "BOS", 1, 720.0, made_two, true));
        rows.push(player_snap(4, "n1", "NYK", 1, 720.0, StatLine { fga: 2, ..Default::default() }, true));
        let meta = ContestMeta::new("g1", "BOS", "NYK")
            .with_tipoff(Utc.with_ymd_and_hms(2024, 1, 15, 0, 30, 0).unwrap());
        let bio = PlayerBio {
            player_id: "b1".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1998, 3, 14),
            ..Default::default()
        };
        ContestInput::new(meta, rows).with_bios([bio])
    }

    #[test]
    fn test_runs_all_components() {
        let mut config = AnalyticsConfig::default();
        config.granularities = vec![Granularity::Period, Granularity::Regulation { window_seconds: 360 }];
        let pipeline = ContestPipeline::new(config).unwrap();
        let output = pipeline.run(&small_contest()).unwrap();

        // One played period: 1 period window + 2 regulation windows, 10 players each
        assert_eq!(output.interval_stats.len(), 30);
        let b1_q1 = output
            .interval_stats
            .iter()
            .find(|s| s.entity_id == "b1" && s.window.set == "period")
            .unwrap();
        assert_eq!(b1_q1.line.pts, 2);
        assert!(b1_q1.metrics.pace > 0.0);
        assert!(b1_q1.career.is_some());
        let n2 = output.interval_stats.iter().find(|s| s.entity_id == "n2").unwrap();
        assert!(n2.career.is_none());

        assert_eq!(output.lineups.len(), 2);
        assert_eq!(output.stints.len(), 10);
        assert!(output.stints.iter().all(|s| s.end_event == Some(4)));
        assert_eq!(output.possessions.len(), 1);
        assert_eq!(output.diagnostics.possession_method, Some(AttributionMethod::FixedBucket));
        assert_eq!(output.diagnostics.clamped_rows, 0);
    }

    #[test]
    fn test_team_context_uses_player_sums_without_team_rows() {
        let mut config = AnalyticsConfig::default();
        config.granularities = vec![Granularity::Period];
        let output = ContestPipeline::new(config).unwrap().run(&small_contest()).unwrap();
        let n1 = output.interval_stats.iter().find(|s| s.entity_id == "n1").unwrap();
        // Opponent scored 2 on BOS-side possessions
        assert!(n1.metrics.def_rating > 0.0);
    }

    #[test]
    fn test_missing_meta_is_input_failure() {
        let input = ContestInput { meta: None, ..Default::default() };
        let pipeline = ContestPipeline::new(AnalyticsConfig::default()).unwrap();
        let failure = pipeline.run(&input).unwrap_err();
        assert_eq!(failure.component, Component::Input);
    }

    #[test]
    fn test_decisecond_ranges() {
        let mut config = AnalyticsConfig::default();
        config.granularities = Vec::new();
        config.decisecond_ranges = vec![ClockRange::new(59.0, 60.0), ClockRange::new(10.0, 5.0)];
        let pipeline = ContestPipeline::new(config).unwrap();
        assert_eq!(pipeline.rejected_ranges(), 1);

        let output = pipeline.run(&small_contest()).unwrap();
        let b1: Vec<&IntervalStat> = output.interval_stats.iter().filter(|s| s.entity_id == "b1").collect();
        assert_eq!(b1.len(), 10);
        assert_eq!(b1.iter().map(|s| s.line.pts).sum::<u32>(), 2);
        assert_eq!(b1.last().map(|s| s.line.pts), Some(2));
    }

    #[test]
    fn test_bad_granularity_rejected_up_front() {
        let mut config = AnalyticsConfig::default();
        config.granularities = vec![Granularity::Regulation { window_seconds: 50 }];
        assert!(matches!(ContestPipeline::new(config), Err(AnalyticsError::Configuration(_))));
    }
}
