//! Snapshot log CSV → typed `Snapshot` rows
//!
//! One row per (contest, event, entity). Expected header:
//!
//! ```text
//! contest_id,event_number,entity_id,entity_kind,team,period,elapsed_seconds,
//! pts,fgm,fga,fg3m,fg3a,ftm,fta,oreb,dreb,ast,stl,blk,tov,pf,minutes,
//! on_court,possession_team
//! ```
//!
//! Stat columns may be omitted (zero). `entity_kind` is `player` or `team`;
//! `on_court` accepts `1/0`, `true/false`, `yes/no`. Rows are validated once
//! here; anything malformed is counted and skipped.

use anyhow::{Context, Result};
use ob_core::config::AnalyticsConfig;
use ob_core::models::{EntityKind, GameClock, Snapshot, StatLine};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

/// CSV parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub failed: u32,
}

impl ParseStats {
    pub fn merge(&mut self, other: &ParseStats) {
        self.total_rows += other.total_rows;
        self.parsed += other.parsed;
        self.failed += other.failed;
    }
}

/// Source team names → canonical team ids.
///
/// Lookup is case-insensitive on the trimmed name; unknown names pass
/// through unchanged so canonical ids need no alias entry.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    aliases: FxHashMap<String, String>,
}

impl TeamDirectory {
    pub fn new<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let aliases = aliases
            .into_iter()
            .map(|(name, id)| (name.as_ref().trim().to_lowercase(), id.into()))
            .collect();
        Self { aliases }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.team_aliases.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }

    pub fn canonical(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.aliases.get(&trimmed.to_lowercase()).cloned().unwrap_or_else(|| trimmed.to_string())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    contest_id: String,
    event_number: u32,
    entity_id: String,
    entity_kind: String,
    team: String,
    period: u8,
    elapsed_seconds: f64,
    #[serde(default)]
    pts: u32,
    #[serde(default)]
    fgm: u32,
    #[serde(default)]
    fga: u32,
    #[serde(default)]
    fg3m: u32,
    #[serde(default)]
    fg3a: u32,
    #[serde(default)]
    ftm: u32,
    #[serde(default)]
    fta: u32,
    #[serde(default)]
    oreb: u32,
    #[serde(default)]
    dreb: u32,
    #[serde(default)]
    ast: u32,
    #[serde(default)]
    stl: u32,
    #[serde(default)]
    blk: u32,
    #[serde(default)]
    tov: u32,
    #[serde(default)]
    pf: u32,
    #[serde(default)]
    minutes: f64,
    #[serde(default)]
    on_court: String,
    #[serde(default)]
    possession_team: Option<String>,
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "" | "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

impl SnapshotRow {
    fn into_snapshot(self, teams: &TeamDirectory) -> Result<Snapshot, String> {
        let entity_kind = match self.entity_kind.trim().to_lowercase().as_str() {
            "player" => EntityKind::Player,
            "team" => EntityKind::Team,
            other => return Err(format!("unknown entity_kind '{}'", other)),
        };
        if self.period == 0 {
            return Err("period must start at 1".to_string());
        }
        if !self.minutes.is_finite() || self.minutes < 0.0 {
            return Err(format!("invalid minutes {}", self.minutes));
        }
        let elapsed = GameClock::from_secs_f64(self.elapsed_seconds)
            .ok_or_else(|| format!("invalid elapsed_seconds {}", self.elapsed_seconds))?;
        let on_court =
            parse_flag(&self.on_court).ok_or_else(|| format!("invalid on_court '{}'", self.on_court))?;

        let team_id = teams.canonical(&self.team);
        let entity_id = match entity_kind {
            EntityKind::Team => teams.canonical(&self.entity_id),
            EntityKind::Player => self.entity_id.trim().to_string(),
        };
        if entity_id.is_empty() || team_id.is_empty() {
            return Err("empty entity or team id".to_string());
        }

        Ok(Snapshot {
            contest_id: self.contest_id.trim().to_string(),
            event_number: self.event_number,
            entity_id,
            entity_kind,
            team_id,
            period: self.period,
            elapsed,
            stats: StatLine {
                pts: self.pts,
                fgm: self.fgm,
                fga: self.fga,
                fg3m: self.fg3m,
                fg3a: self.fg3a,
                ftm: self.ftm,
                fta: self.fta,
                oreb: self.oreb,
                dreb: self.dreb,
                ast: self.ast,
                stl: self.stl,
                blk: self.blk,
                tov: self.tov,
                pf: self.pf,
                minutes: self.minutes,
            },
            on_court,
            possession_team_id: self
                .possession_team
                .filter(|t| !t.trim().is_empty())
                .map(|t| teams.canonical(&t)),
        })
    }
}

/// Parse a snapshot log CSV.
///
/// # Returns
///
/// * `Ok((snapshots, stats))` - Valid rows in file order and parse statistics
/// * `Err(anyhow::Error)` - The file could not be opened
pub fn parse_snapshot_csv(csv_path: &Path, teams: &TeamDirectory) -> Result<(Vec<Snapshot>, ParseStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut snapshots = Vec::new();
    let mut stats = ParseStats::default();

    for (idx, record) in reader.deserialize::<SnapshotRow>().enumerate() {
        // Header is line 1
        let line = idx + 2;
        stats.total_rows += 1;

        let parsed = record.map_err(|e| e.to_string()).and_then(|row| row.into_snapshot(teams));
        match parsed {
            Ok(snapshot) => {
                snapshots.push(snapshot);
                stats.parsed += 1;
            }
            Err(err) => {
                stats.failed += 1;
                log::warn!("{}: line {} skipped: {}", csv_path.display(), line, err);
            }
        }
    }

    log::info!(
        "Parsed {} snapshots from {} ({} rows skipped)",
        stats.parsed,
        csv_path.display(),
        stats.failed
    );
    Ok((snapshots, stats))
}
