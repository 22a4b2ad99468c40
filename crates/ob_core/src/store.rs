//! # Snapshot Store
//!
//! Ordered, read-only access to cumulative snapshots.
//!
//! Rows are deduplicated on `(contest_id, event_number, entity_id)` at
//! construction (first occurrence wins) and indexed two ways:
//! - per entity, ascending by elapsed clock, for nearest-preceding lookups
//!   by binary search
//! - per event, for reading every entity's state at one event

use crate::error::DataQualityWarning;
use crate::models::{EntityKind, GameClock, Snapshot};
use fxhash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct EntitySeries {
    /// Indices into `rows`, ascending by (elapsed, event_number)
    indices: Vec<usize>,
    /// Elapsed clock of each index, kept parallel for binary search
    clocks: Vec<GameClock>,
}

/// Counters for problems found while building the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreDiagnostics {
    pub duplicates_dropped: usize,
    /// Consecutive snapshot pairs where a cumulative field decreased
    pub monotonic_violations: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    /// All rows, sorted by (contest_id, event_number, entity_id)
    rows: Vec<Snapshot>,
    series: FxHashMap<(String, String), EntitySeries>,
    diagnostics: StoreDiagnostics,
}

impl SnapshotStore {
    pub fn from_snapshots<I: IntoIterator<Item = Snapshot>>(snapshots: I) -> Self {
        let mut seen: FxHashSet<(String, u32, String)> = FxHashSet::default();
        let mut diagnostics = StoreDiagnostics::default();
        let mut rows = Vec::new();

        for snapshot in snapshots {
            let key =
                (snapshot.contest_id.clone(), snapshot.event_number, snapshot.entity_id.clone());
            if !seen.insert(key) {
                diagnostics.duplicates_dropped += 1;
                log::warn!(
                    "{:?}: contest {} event {} entity {}, keeping first row",
                    DataQualityWarning::DuplicateSnapshotKey,
                    snapshot.contest_id,
                    snapshot.event_number,
                    snapshot.entity_id
                );
                continue;
            }
            rows.push(snapshot);
        }

        rows.sort_by(|a, b| {
            a.contest_id
                .cmp(&b.contest_id)
                .then(a.event_number.cmp(&b.event_number))
                .then(a.entity_id.cmp(&b.entity_id))
        });

        let mut series: FxHashMap<(String, String), EntitySeries> = FxHashMap::default();
        for (idx, row) in rows.iter().enumerate() {
            series
                .entry((row.contest_id.clone(), row.entity_id.clone()))
                .or_default()
                .indices
                .push(idx);
        }

        for entity in series.values_mut() {
            entity.indices.sort_by(|&a, &b| {
                rows[a].elapsed.cmp(&rows[b].elapsed).then(rows[a].event_number.cmp(&rows[b].event_number))
            });
            entity.clocks = entity.indices.iter().map(|&i| rows[i].elapsed).collect();

            for pair in entity.indices.windows(2) {
                let (earlier, later) = (&rows[pair[0]], &rows[pair[1]]);
                if let Some(field) = later.stats.first_decrease(&earlier.stats) {
                    diagnostics.monotonic_violations += 1;
                    log::warn!(
                        "Non-monotonic {} for {} in contest {} between events {} and {}",
                        field,
                        later.entity_id,
                        later.contest_id,
                        earlier.event_number,
                        later.event_number
                    );
                }
            }
        }

        Self { rows, series, diagnostics }
    }

    pub fn diagnostics(&self) -> StoreDiagnostics {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Snapshots of one entity, ascending by elapsed clock.
    ///
    /// The returned iterator is `Clone`, so it can be restarted freely.
    pub fn snapshots_for<'a>(
        &'a self,
        contest_id: &str,
        entity_id: &str,
    ) -> impl Iterator<Item = &'a Snapshot> + Clone + 'a {
        let indices: &'a [usize] = self
            .series
            .get(&(contest_id.to_string(), entity_id.to_string()))
            .map(|s| s.indices.as_slice())
            .unwrap_or(&[]);
        indices.iter().map(move |&i| &self.rows[i])
    }

    /// Every entity's snapshot recorded at `event_number`.
    pub fn snapshots_at_event(&self, contest_id: &str, event_number: u32) -> &[Snapshot] {
        let start = self.rows.partition_point(|r| {
            (r.contest_id.as_str(), r.event_number) < (contest_id, event_number)
        });
        let end = self.rows.partition_point(|r| {
            (r.contest_id.as_str(), r.event_number) <= (contest_id, event_number)
        });
        &self.rows[start..end]
    }

    /// Latest snapshot with `elapsed <= clock`, if any.
    pub fn latest_at_or_before(
        &self,
        contest_id: &str,
        entity_id: &str,
        clock: GameClock,
    ) -> Option<&Snapshot> {
        let series = self.series.get(&(contest_id.to_string(), entity_id.to_string()))?;
        let pos = series.clocks.partition_point(|c| *c <= clock);
        if pos == 0 {
            return None;
        }
        Some(&self.rows[series.indices[pos - 1]])
    }

    pub fn has_entity(&self, contest_id: &str, entity_id: &str) -> bool {
        self.series.contains_key(&(contest_id.to_string(), entity_id.to_string()))
    }

    pub fn contest_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rows.iter().map(|r| r.contest_id.as_str()).collect();
        ids.dedup();
        ids
    }

    /// Entity ids of one kind in a contest, with their team, sorted by id.
    pub fn entities(&self, contest_id: &str, kind: EntityKind) -> Vec<(&str, &str)> {
        let mut found: BTreeMap<&str, &str> = BTreeMap::new();
        for row in self.contest_rows(contest_id) {
            if row.entity_kind == kind {
                found.entry(row.entity_id.as_str()).or_insert(row.team_id.as_str());
            }
        }
        found.into_iter().collect()
    }

    /// Distinct event numbers of a contest, ascending.
    pub fn event_numbers(&self, contest_id: &str) -> Vec<u32> {
        let mut events: Vec<u32> = self.contest_rows(contest_id).iter().map(|r| r.event_number).collect();
        events.dedup();
        events
    }

    /// Latest elapsed clock observed in each period.
    pub fn period_extents(&self, contest_id: &str) -> BTreeMap<u8, GameClock> {
        let mut extents: BTreeMap<u8, GameClock> = BTreeMap::new();
        for row in self.contest_rows(contest_id) {
            let latest = extents.entry(row.period).or_insert(row.elapsed);
            if row.elapsed > *latest {
                *latest = row.elapsed;
            }
        }
        extents
    }

    fn contest_rows(&self, contest_id: &str) -> &[Snapshot] {
        let start = self.rows.partition_point(|r| r.contest_id.as_str() < contest_id);
        let end = self.rows.partition_point(|r| r.contest_id.as_str() <= contest_id);
        &self.rows[start..end]
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{EntityKind, GameClock, Snapshot, StatLine};

    pub fn player_snap(
        event: u32,
        player: &str,
        team: &str,
        period: u8,
        secs: f64,
        stats: StatLine,
        on_court: bool,
    ) -> Snapshot {
        Snapshot {
            contest_id: "g1".to_string(),
            event_number: event,
            entity_id: player.to_string(),
            entity_kind: EntityKind::Player,
            team_id: team.to_string(),
            period,
            elapsed: GameClock::from_secs_f64(secs).unwrap_or_default(),
            stats,
            on_court,
            possession_team_id: None,
        }
    }

    pub fn team_snap(event: u32, team: &str, period: u8, secs: f64, stats: StatLine) -> Snapshot {
        Snapshot {
            entity_kind: EntityKind::Team,
            ..player_snap(event, team, team, period, secs, stats, false)
        }
    }

    pub fn pts(pts: u32) -> StatLine {
        StatLine { pts, ..Default::default() }
    }
}
