//! Loader Library
//!
//! CSV snapshot logs, contest manifests and player bios → `ContestInput`
//! batches for `ob_core`.

pub mod metadata_csv;
pub mod snapshot_csv;

use anyhow::{Context, Result};
use ob_core::models::{ContestInput, ContestMeta, Snapshot};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use metadata_csv::{parse_bio_csv, parse_contest_manifest, BioIndex};
pub use snapshot_csv::{parse_snapshot_csv, ParseStats, TeamDirectory};

/// CSV files to read: the path itself, or every `*.csv` in it sorted by name.
fn snapshot_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("csv"))
        .collect();
    files.sort();
    Ok(files)
}

/// Assemble one `ContestInput` per manifest entry, in manifest order.
///
/// Snapshots for contests absent from the manifest are dropped with a
/// warning. Each input carries the bios of the players it mentions.
pub fn load_batch(
    snapshots: &Path,
    manifest: &[ContestMeta],
    bios: &BioIndex,
    teams: &TeamDirectory,
) -> Result<(Vec<ContestInput>, ParseStats)> {
    let mut stats = ParseStats::default();
    let mut by_contest: BTreeMap<String, Vec<Snapshot>> = BTreeMap::new();

    for file in snapshot_files(snapshots)? {
        let (rows, file_stats) = parse_snapshot_csv(&file, teams)?;
        stats.merge(&file_stats);
        for row in rows {
            by_contest.entry(row.contest_id.clone()).or_default().push(row);
        }
    }

    let mut inputs = Vec::with_capacity(manifest.len());
    for meta in manifest {
        let rows = by_contest.remove(&meta.contest_id).unwrap_or_default();
        if rows.is_empty() {
            log::warn!("Contest {} has no snapshots", meta.contest_id);
        }
        let players: FxHashSet<&str> =
            rows.iter().filter(|s| s.is_player()).map(|s| s.entity_id.as_str()).collect();
        let contest_bios: Vec<_> = players.iter().filter_map(|id| bios.get(id)).cloned().collect();
        inputs.push(ContestInput::new(meta.clone(), rows).with_bios(contest_bios));
    }

    for (contest_id, rows) in &by_contest {
        log::warn!("Dropping {} snapshots for contest {} missing from the manifest", rows.len(), contest_id);
    }

    log::info!("Loaded {} contests ({} snapshot rows)", inputs.len(), stats.parsed);
    Ok((inputs, stats))
}
