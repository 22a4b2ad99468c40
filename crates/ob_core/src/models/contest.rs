//! Contest metadata and read-only biographical records

use super::snapshot::{GameClock, Snapshot};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Static facts about one contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestMeta {
    pub contest_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    /// Wall-clock tip-off, used to timestamp elapsed contest time.
    #[serde(default)]
    pub tipoff: Option<DateTime<Utc>>,
}

impl ContestMeta {
    pub fn new(contest_id: &str, home_team_id: &str, away_team_id: &str) -> Self {
        Self {
            contest_id: contest_id.to_string(),
            home_team_id: home_team_id.to_string(),
            away_team_id: away_team_id.to_string(),
            tipoff: None,
        }
    }

    pub fn with_tipoff(mut self, tipoff: DateTime<Utc>) -> Self {
        self.tipoff = Some(tipoff);
        self
    }

    /// The other team in this contest, if `team_id` plays in it.
    pub fn opponent_of(&self, team_id: &str) -> Option<&str> {
        if team_id == self.home_team_id {
            Some(&self.away_team_id)
        } else if team_id == self.away_team_id {
            Some(&self.home_team_id)
        } else {
            None
        }
    }

    /// Approximate wall-clock time for an elapsed contest clock.
    ///
    /// Stoppages are not modelled, so this is tip-off plus game time.
    pub fn timestamp_at(&self, clock: GameClock) -> Option<DateTime<Utc>> {
        let tipoff = self.tipoff?;
        Some(tipoff + Duration::milliseconds(clock.ticks() as i64 * 100))
    }
}

/// Biographical and draft metadata for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerBio {
    pub player_id: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub debut_date: Option<NaiveDate>,
    #[serde(default)]
    pub height_cm: Option<f32>,
    #[serde(default)]
    pub weight_kg: Option<f32>,
    #[serde(default)]
    pub wingspan_cm: Option<f32>,
    #[serde(default)]
    pub draft_year: Option<u16>,
    #[serde(default)]
    pub draft_pick: Option<u16>,
}

/// Everything needed to process one contest.
#[derive(Debug, Clone, Default)]
pub struct ContestInput {
    pub meta: Option<ContestMeta>,
    pub snapshots: Vec<Snapshot>,
    pub bios: FxHashMap<String, PlayerBio>,
}

impl ContestInput {
    pub fn new(meta: ContestMeta, snapshots: Vec<Snapshot>) -> Self {
        Self { meta: Some(meta), snapshots, bios: FxHashMap::default() }
    }

    pub fn with_bios<I: IntoIterator<Item = PlayerBio>>(mut self, bios: I) -> Self {
        for bio in bios {
            self.bios.insert(bio.player_id.clone(), bio);
        }
        self
    }

    pub fn contest_id(&self) -> &str {
        self.meta.as_ref().map(|m| m.contest_id.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_opponent_lookup() {
        let meta = ContestMeta::new("g1", "BOS", "LAL");
        assert_eq!(meta.opponent_of("BOS"), Some("LAL"));
        assert_eq!(meta.opponent_of("LAL"), Some("BOS"));
        assert_eq!(meta.opponent_of("NYK"), None);
    }

    #[test]
    fn test_timestamp_at_adds_game_time() {
        let tip = Utc.with_ymd_and_hms(2024, 1, 10, 0, 30, 0).unwrap();
        let meta = ContestMeta::new("g1", "BOS", "LAL").with_tipoff(tip);
        let ts = meta.timestamp_at(GameClock::from_secs(720)).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 10, 0, 42, 0).unwrap());
        assert!(ContestMeta::new("g1", "BOS", "LAL").timestamp_at(GameClock::ZERO).is_none());
    }
}
