//! Contest manifest and player biography CSVs.

use crate::snapshot_csv::{ParseStats, TeamDirectory};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ob_core::models::{ContestMeta, PlayerBio};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::path::Path;

/// Read-only biography lookup by player id
#[derive(Debug, Clone, Default)]
pub struct BioIndex {
    pub bios: FxHashMap<String, PlayerBio>,
}

impl BioIndex {
    pub fn insert(&mut self, bio: PlayerBio) {
        self.bios.insert(bio.player_id.clone(), bio);
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerBio> {
        self.bios.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.bios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bios.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ManifestRow {
    contest_id: String,
    home_team: String,
    away_team: String,
    #[serde(default)]
    tipoff: Option<String>,
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))
}

/// Parse `contest_id,home_team,away_team[,tipoff]`.
///
/// `tipoff` is RFC 3339. Repeated contest ids keep the first row.
pub fn parse_contest_manifest(path: &Path, teams: &TeamDirectory) -> Result<(Vec<ContestMeta>, ParseStats)> {
    let mut reader = reader(path)?;
    let mut contests = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stats = ParseStats::default();

    for (idx, record) in reader.deserialize::<ManifestRow>().enumerate() {
        let line = idx + 2;
        stats.total_rows += 1;

        let row = match record {
            Ok(row) => row,
            Err(e) => {
                stats.failed += 1;
                log::warn!("{}: line {} skipped: {}", path.display(), line, e);
                continue;
            }
        };

        let tipoff = match row.tipoff.as_deref().filter(|t| !t.is_empty()) {
            None => None,
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    stats.failed += 1;
                    log::warn!("{}: line {} bad tipoff '{}': {}", path.display(), line, raw, e);
                    continue;
                }
            },
        };

        if !seen.insert(row.contest_id.clone()) {
            stats.failed += 1;
            log::warn!("{}: line {} repeats contest {}", path.display(), line, row.contest_id);
            continue;
        }

        let mut meta = ContestMeta::new(&row.contest_id, &teams.canonical(&row.home_team), &teams.canonical(&row.away_team));
        meta.tipoff = tipoff;
        contests.push(meta);
        stats.parsed += 1;
    }

    Ok((contests, stats))
}

/// Parse player biographies. Every column but `player_id` may be empty.
///
/// Header: `player_id,birth_date,debut_date,height_cm,weight_kg,wingspan_cm,draft_year,draft_pick`
/// with dates as `YYYY-MM-DD`.
pub fn parse_bio_csv(path: &Path) -> Result<(BioIndex, ParseStats)> {
    let mut reader = reader(path)?;
    let mut index = BioIndex::default();
    let mut stats = ParseStats::default();

    for (idx, record) in reader.deserialize::<PlayerBio>().enumerate() {
        stats.total_rows += 1;
        match record {
            Ok(bio) if !bio.player_id.is_empty() => {
                index.insert(bio);
                stats.parsed += 1;
            }
            Ok(_) => {
                stats.failed += 1;
                log::warn!("{}: line {} has no player_id", path.display(), idx + 2);
            }
            Err(e) => {
                stats.failed += 1;
                log::warn!("{}: line {} skipped: {}", path.display(), idx + 2, e);
            }
        }
    }

    log::info!("Loaded {} player bios from {}", index.len(), path.display());
    Ok((index, stats))
}
