//! Event-by-event replay of on-court state.
//!
//! Player on-court flags and team scores carry forward between events, so a
//! source that only emits rows for entities that changed is handled the same
//! as one that emits every entity at every event.

use super::hash::Lineup;
use super::possession::EventFrame;
use super::stint::{Score, StintTracker};
use crate::models::{ContestMeta, EntityKind, GameClock, LineupSnapshot, Snapshot, Stint};
use crate::store::SnapshotStore;
use fxhash::FxHashMap;
use std::collections::BTreeMap;

/// Everything derived from replaying a contest's events.
#[derive(Debug, Clone, Default)]
pub struct LineupOutcome {
    pub lineups: Vec<LineupSnapshot>,
    pub stints: Vec<Stint>,
    pub frames: Vec<EventFrame>,
    /// Team-events where the on-court set was not a valid five
    pub invalid_lineup_events: usize,
}

pub struct LineupTracker<'a> {
    meta: &'a ContestMeta,
    /// player -> (team, on court), sorted so lineups read in id order
    players: BTreeMap<String, (String, bool)>,
    player_points: FxHashMap<String, (String, u32)>,
    team_points: FxHashMap<String, u32>,
    current: FxHashMap<String, String>,
    stints: StintTracker,
    lineups: Vec<LineupSnapshot>,
    frames: Vec<EventFrame>,
    invalid_lineup_events: usize,
    last: Option<(u32, GameClock)>,
}

impl<'a> LineupTracker<'a> {
    pub fn new(meta: &'a ContestMeta) -> Self {
        Self {
            meta,
            players: BTreeMap::new(),
            player_points: FxHashMap::default(),
            team_points: FxHashMap::default(),
            current: FxHashMap::default(),
            stints: StintTracker::new(meta.contest_id.clone()),
            lineups: Vec::new(),
            frames: Vec::new(),
            invalid_lineup_events: 0,
            last: None,
        }
    }

    /// Apply every row recorded at one event. Events must arrive in
    /// ascending order.
    pub fn ingest(&mut self, event_number: u32, rows: &[Snapshot]) {
        let Some(first) = rows.first() else {
            return;
        };
        let (period, elapsed) = (first.period, first.elapsed);

        for row in rows {
            match row.entity_kind {
                EntityKind::Player => {
                    self.players.insert(row.entity_id.clone(), (row.team_id.clone(), row.on_court));
                    self.player_points.insert(row.entity_id.clone(), (row.team_id.clone(), row.stats.pts));
                }
                EntityKind::Team => {
                    self.team_points.insert(row.team_id.clone(), row.stats.pts);
                }
            }
        }

        for row in rows.iter().filter(|r| r.is_player()) {
            let score = self.score_for(&row.team_id);
            self.stints.observe(&row.entity_id, &row.team_id, row.on_court, event_number, elapsed, score);
        }

        let meta = self.meta;
        let home_lineup = self.refresh_lineup(&meta.home_team_id, event_number, period, elapsed);
        let away_lineup = self.refresh_lineup(&meta.away_team_id, event_number, period, elapsed);

        self.frames.push(EventFrame {
            event_number,
            period,
            elapsed,
            home_score: self.points(&meta.home_team_id),
            away_score: self.points(&meta.away_team_id),
            home_lineup,
            away_lineup,
            possession_team: rows.iter().find_map(|r| r.possession_team_id.clone()),
        });
        self.last = Some((event_number, elapsed));
    }

    pub fn finish(self) -> LineupOutcome {
        let home = self.points(&self.meta.home_team_id);
        let away = self.points(&self.meta.away_team_id);
        let meta = self.meta;
        let score_for_team = |team: &str| {
            if team == meta.home_team_id {
                Score { own: home, opponent: away }
            } else if team == meta.away_team_id {
                Score { own: away, opponent: home }
            } else {
                Score::default()
            }
        };

        let (final_event, final_clock) = self.last.unwrap_or((0, GameClock::ZERO));
        LineupOutcome {
            stints: self.stints.finish(final_event, final_clock, score_for_team),
            lineups: self.lineups,
            frames: self.frames,
            invalid_lineup_events: self.invalid_lineup_events,
        }
    }

    /// Team points: the team row when the source has one, otherwise the sum
    /// of its players' latest totals.
    fn points(&self, team_id: &str) -> u32 {
        if let Some(pts) = self.team_points.get(team_id) {
            return *pts;
        }
        self.player_points
            .values()
            .filter(|(team, _)| team == team_id)
            .map(|(_, pts)| pts)
            .sum()
    }

    fn score_for(&self, team_id: &str) -> Score {
        Score {
            own: self.points(team_id),
            opponent: self.meta.opponent_of(team_id).map(|opp| self.points(opp)).unwrap_or(0),
        }
    }

    fn refresh_lineup(&mut self, team_id: &str, event_number: u32, period: u8, elapsed: GameClock) -> Option<String> {
        let on_court: Vec<&str> = self
            .players
            .iter()
            .filter(|(_, (team, on))| *on && team == team_id)
            .map(|(id, _)| id.as_str())
            .collect();
        if on_court.is_empty() {
            self.current.remove(team_id);
            return None;
        }

        let lineup = match Lineup::new(&on_court) {
            Ok(lineup) => lineup,
            Err(err) => {
                log::debug!(
                    "Contest {} event {} team {}: {}",
                    self.meta.contest_id,
                    event_number,
                    team_id,
                    err
                );
                self.invalid_lineup_events += 1;
                self.current.remove(team_id);
                return None;
            }
        };

        if self.current.get(team_id).map(String::as_str) != Some(lineup.hash()) {
            self.current.insert(team_id.to_string(), lineup.hash().to_string());
            self.lineups.push(LineupSnapshot {
                contest_id: self.meta.contest_id.clone(),
                event_number,
                period,
                elapsed_ticks: elapsed.ticks(),
                team_id: team_id.to_string(),
                lineup_hash: lineup.hash().to_string(),
                players: lineup.players().to_vec(),
            });
        }
        Some(lineup.hash().to_string())
    }
}

/// Replay every event of one contest in the store.
pub fn track_contest(store: &SnapshotStore, meta: &ContestMeta) -> LineupOutcome {
    let mut tracker = LineupTracker::new(meta);
    for event in store.event_numbers(&meta.contest_id) {
        tracker.ingest(event, store.snapshots_at_event(&meta.contest_id, event));
    }
    tracker.finish()
}
