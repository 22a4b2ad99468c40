//! Possession attribution over per-event frames.

use crate::models::{AttributionMethod, ContestMeta, GameClock, Possession};
use fxhash::FxHashMap;

/// Contest state after applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFrame {
    pub event_number: u32,
    pub period: u8,
    pub elapsed: GameClock,
    pub home_score: u32,
    pub away_score: u32,
    pub home_lineup: Option<String>,
    pub away_lineup: Option<String>,
    /// Team in possession, when the source signals it
    pub possession_team: Option<String>,
}

impl EventFrame {
    fn score_of(&self, meta: &ContestMeta, team_id: &str) -> u32 {
        if team_id == meta.home_team_id {
            self.home_score
        } else {
            self.away_score
        }
    }

    fn lineup_of(&self, meta: &ContestMeta, team_id: &str) -> Option<String> {
        if team_id == meta.home_team_id {
            self.home_lineup.clone()
        } else {
            self.away_lineup.clone()
        }
    }
}

/// Splits a contest's event frames into possessions.
pub trait PossessionModel {
    fn method(&self) -> AttributionMethod;

    fn attribute(&self, meta: &ContestMeta, frames: &[EventFrame]) -> Vec<Possession>;
}

/// Running points-per-possession per offensive team.
#[derive(Default)]
struct PossessionLedger {
    totals: FxHashMap<String, (u32, u32)>,
    rows: Vec<Possession>,
}

impl PossessionLedger {
    fn push(
        &mut self,
        meta: &ContestMeta,
        method: AttributionMethod,
        offense: &str,
        segment: &[EventFrame],
        before: Option<&EventFrame>,
    ) {
        let (Some(first), Some(last)) = (segment.first(), segment.last()) else {
            return;
        };
        let defense = meta.opponent_of(offense).unwrap_or_default().to_string();
        let baseline = before.map(|f| f.score_of(meta, offense)).unwrap_or(0);
        let points = last.score_of(meta, offense).saturating_sub(baseline);

        let totals = self.totals.entry(offense.to_string()).or_insert((0, 0));
        totals.0 += points;
        totals.1 += 1;

        self.rows.push(Possession {
            contest_id: meta.contest_id.clone(),
            possession_number: self.rows.len() as u32 + 1,
            period: first.period,
            start_event: first.event_number,
            end_event: last.event_number,
            offensive_team_id: offense.to_string(),
            offensive_lineup_hash: first.lineup_of(meta, offense),
            defensive_lineup_hash: first.lineup_of(meta, &defense),
            defensive_team_id: defense,
            points_scored: points,
            running_points_per_possession: totals.0 as f64 / totals.1 as f64,
            method,
        });
    }
}

/// Fixed-size event buckets, offense alternating home then away.
///
/// An approximation: it ignores turnovers, rebounds and the shot clock, so
/// per-possession points are only meaningful in aggregate.
#[derive(Debug, Clone, Copy)]
pub struct FixedBucketModel {
    bucket_size: usize,
}

impl FixedBucketModel {
    /// `bucket_size` of zero is treated as one.
    pub fn new(bucket_size: usize) -> Self {
        Self { bucket_size: bucket_size.max(1) }
    }
}

impl PossessionModel for FixedBucketModel {
    fn method(&self) -> AttributionMethod {
        AttributionMethod::FixedBucket
    }

    fn attribute(&self, meta: &ContestMeta, frames: &[EventFrame]) -> Vec<Possession> {
        let mut ledger = PossessionLedger::default();
        for (i, bucket) in frames.chunks(self.bucket_size).enumerate() {
            let offense = if i % 2 == 0 { &meta.home_team_id } else { &meta.away_team_id };
            let before = (i * self.bucket_size).checked_sub(1).map(|idx| &frames[idx]);
            ledger.push(meta, self.method(), offense, bucket, before);
        }
        ledger.rows
    }
}

/// Boundaries from the source's possession signal.
///
/// A possession ends when the signalled team changes or the period ends.
/// Frames without a signal extend the current possession; frames before the
/// first signal are not attributed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitChangeModel;

impl ExplicitChangeModel {
    /// True when any frame carries a possession signal.
    pub fn applies_to(frames: &[EventFrame]) -> bool {
        frames.iter().any(|f| f.possession_team.is_some())
    }
}

impl PossessionModel for ExplicitChangeModel {
    fn method(&self) -> AttributionMethod {
        AttributionMethod::ExplicitChange
    }

    fn attribute(&self, meta: &ContestMeta, frames: &[EventFrame]) -> Vec<Possession> {
        let mut ledger = PossessionLedger::default();
        let mut current: Option<(String, usize)> = None;

        for (idx, frame) in frames.iter().enumerate() {
            let Some((team, start)) = current.as_ref() else {
                if let Some(team) = &frame.possession_team {
                    current = Some((team.clone(), idx));
                }
                continue;
            };

            let changed = frame.possession_team.as_ref().is_some_and(|t| t != team);
            let new_period = frame.period != frames[*start].period;
            if changed || new_period {
                let before = start.checked_sub(1).map(|b| &frames[b]);
                ledger.push(meta, self.method(), team, &frames[*start..idx], before);
                current = match &frame.possession_team {
                    Some(next) => Some((next.clone(), idx)),
                    // Period turned over without a signal: keep the team.
                    None => Some((team.clone(), idx)),
                };
            }
        }

        if let Some((team, start)) = current {
            let before = start.checked_sub(1).map(|b| &frames[b]);
            ledger.push(meta, self.method(), &team, &frames[start..], before);
        }
        ledger.rows
    }
}
