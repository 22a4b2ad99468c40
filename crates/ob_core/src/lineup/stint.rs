//! Per-player on-court stints.
//!
//! A stint opens on an off→on transition and closes on on→off. A stint still
//! open when the data ends is closed at the final observed event. Plus-minus
//! is the change in the player's team margin between the two events.

use crate::models::{GameClock, Stint};
use fxhash::FxHashMap;

/// Team score pair at an event, from the player's team perspective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub own: u32,
    pub opponent: u32,
}

#[derive(Debug)]
struct OpenStint {
    index: usize,
    at_open: Score,
}

#[derive(Debug, Default)]
pub struct StintTracker {
    contest_id: String,
    stints: Vec<Stint>,
    open: FxHashMap<String, OpenStint>,
    counts: FxHashMap<String, u32>,
}

impl StintTracker {
    pub fn new(contest_id: impl Into<String>) -> Self {
        Self { contest_id: contest_id.into(), ..Default::default() }
    }

    /// Record a player's on-court state at an event.
    ///
    /// Players never observed before count as off court, so a starter seen on
    /// court at the first event opens stint 1 there.
    pub fn observe(&mut self, player_id: &str, team_id: &str, on_court: bool, event: u32, at: GameClock, score: Score) {
        match (self.open.contains_key(player_id), on_court) {
            (false, true) => {
                let number = self.counts.entry(player_id.to_string()).or_insert(0);
                *number += 1;
                self.stints.push(Stint {
                    contest_id: self.contest_id.clone(),
                    player_id: player_id.to_string(),
                    team_id: team_id.to_string(),
                    stint_number: *number,
                    start_event: event,
                    end_event: None,
                    start_ticks: at.ticks(),
                    end_ticks: None,
                    points_for: 0,
                    points_against: 0,
                    plus_minus: 0,
                });
                self.open
                    .insert(player_id.to_string(), OpenStint { index: self.stints.len() - 1, at_open: score });
            }
            (true, false) => {
                if let Some(open) = self.open.remove(player_id) {
                    Self::close(&mut self.stints[open.index], &open, event, at, score);
                }
            }
            _ => {}
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Close every open stint at the final observed event and return all
    /// stints ordered by player then stint number.
    pub fn finish<F>(mut self, final_event: u32, at: GameClock, score_for_team: F) -> Vec<Stint>
    where
        F: Fn(&str) -> Score,
    {
        for (_, open) in self.open.drain() {
            let stint = &mut self.stints[open.index];
            let score = score_for_team(&stint.team_id);
            Self::close(stint, &open, final_event, at, score);
        }
        self.stints
            .sort_by(|a, b| a.player_id.cmp(&b.player_id).then(a.stint_number.cmp(&b.stint_number)));
        self.stints
    }

    fn close(stint: &mut Stint, open: &OpenStint, event: u32, at: GameClock, score: Score) {
        stint.end_event = Some(event);
        stint.end_ticks = Some(at.ticks());
        stint.points_for = score.own.saturating_sub(open.at_open.own);
        stint.points_against = score.opponent.saturating_sub(open.at_open.opponent);
        stint.plus_minus = stint.points_for as i64 - stint.points_against as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(secs: u32) -> GameClock {
        GameClock::from_secs(secs)
    }

    fn score(own: u32, opponent: u32) -> Score {
        Score { own, opponent }
    }

    #[test]
    fn test_stint_lifecycle_with_reentry() {
        let mut tracker = StintTracker::new("g1");
        tracker.observe("X", "BOS", true, 10, clock(100), score(4, 2));
        tracker.observe("X", "BOS", true, 30, clock(200), score(9, 6));
        tracker.observe("X", "BOS", false, 47, clock(300), score(14, 10));
        tracker.observe("X", "BOS", false, 50, clock(320), score(14, 12));
        tracker.observe("X", "BOS", true, 60, clock(400), score(16, 15));
        tracker.observe("Y", "BOS", true, 10, clock(100), score(4, 2));

        let stints = tracker.finish(90, clock(600), |_| score(20, 21));
        let x: Vec<&Stint> = stints.iter().filter(|s| s.player_id == "X").collect();
        assert_eq!(x.len(), 2);

        assert_eq!(x[0].stint_number, 1);
        assert_eq!((x[0].start_event, x[0].end_event), (10, Some(47)));
        assert_eq!((x[0].points_for, x[0].points_against, x[0].plus_minus), (10, 8, 2));
        assert!((x[0].seconds_played() - 200.0).abs() < 1e-9);

        assert_eq!(x[1].stint_number, 2);
        assert_eq!((x[1].start_event, x[1].end_event), (60, Some(90)));
        assert_eq!(x[1].plus_minus, 4 - 6);

        let y: Vec<&Stint> = stints.iter().filter(|s| s.player_id == "Y").collect();
        assert_eq!(y.len(), 1);
        assert_eq!(y[0].end_event, Some(90));
        assert!(!y[0].is_open());
    }

    #[test]
    fn test_bench_player_has_no_stints() {
        let mut tracker = StintTracker::new("g1");
        tracker.observe("Z", "BOS", false, 1, clock(0), score(0, 0));
        tracker.observe("Z", "BOS", false, 2, clock(5), score(0, 0));
        assert_eq!(tracker.open_count(), 0);
        assert!(tracker.finish(2, clock(5), |_| score(0, 0)).is_empty());
    }

    #[test]
    fn test_stints_sorted_by_player_and_number() {
        let mut tracker = StintTracker::new("g1");
        tracker.observe("b", "T", true, 1, clock(0), score(0, 0));
        tracker.observe("a", "T", true, 1, clock(0), score(0, 0));
        tracker.observe("a", "T", false, 2, clock(10), score(0, 0));
        tracker.observe("a", "T", true, 3, clock(20), score(0, 0));
        let stints = tracker.finish(4, clock(30), |_| score(0, 0));
        let keys: Vec<(&str, u32)> = stints.iter().map(|s| (s.player_id.as_str(), s.stint_number)).collect();
        assert_eq!(keys, vec![("a", 1), ("a", 2), ("b", 1)]);
    }
}
