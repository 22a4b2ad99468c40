use super::error::CommitError;
use super::OUTPUT_VERSION;
use crate::models::{AttributionMethod, IntervalStat, LineupSnapshot, Possession, Stint};
use serde::{Deserialize, Serialize};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};

const CHECKSUM_LEN: usize = 32;

/// Per-contest counters reported alongside the result tables.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ContestDiagnostics {
    pub duplicates_dropped: usize,
    pub monotonic_violations: usize,
    /// Interval rows with a clamped negative delta
    pub clamped_rows: usize,
    pub missing_baseline_rows: usize,
    pub invalid_lineup_events: usize,
    /// Entities or ranges skipped after a validation error
    pub skipped_units: usize,
    pub possession_method: Option<AttributionMethod>,
}

/// Everything produced for one contest, committed as a unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContestOutput {
    /// Output format version
    pub version: u32,
    pub contest_id: String,
    pub interval_stats: Vec<IntervalStat>,
    pub lineups: Vec<LineupSnapshot>,
    pub stints: Vec<Stint>,
    pub possessions: Vec<Possession>,
    pub diagnostics: ContestDiagnostics,
}

impl ContestOutput {
    pub fn new(contest_id: &str) -> Self {
        Self {
            version: OUTPUT_VERSION,
            contest_id: contest_id.to_string(),
            interval_stats: Vec::new(),
            lineups: Vec::new(),
            stints: Vec::new(),
            possessions: Vec::new(),
            diagnostics: ContestDiagnostics::default(),
        }
    }

    pub fn suspect_rows(&self) -> usize {
        self.interval_stats.iter().filter(|s| s.suspect).count()
    }

    pub fn row_count(&self) -> usize {
        self.interval_stats.len() + self.lineups.len() + self.stints.len() + self.possessions.len()
    }
}

/// MessagePack (named fields), LZ4 with prepended size, SHA-256 trailer.
pub fn encode(output: &ContestOutput) -> Result<Vec<u8>, CommitError> {
    let msgpack = to_vec_named(output)?;
    let mut bytes = compress_prepend_size(&msgpack);

    let checksum = Sha256::digest(&bytes);
    bytes.extend_from_slice(&checksum);
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<ContestOutput, CommitError> {
    // Size header + checksum
    if bytes.len() < 4 + CHECKSUM_LEN {
        return Err(CommitError::Truncated { len: bytes.len() });
    }

    let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if Sha256::digest(payload).as_slice() != checksum {
        return Err(CommitError::ChecksumMismatch);
    }

    let msgpack = decompress_size_prepended(payload)?;
    let output: ContestOutput = from_slice(&msgpack)?;

    if output.version != OUTPUT_VERSION {
        return Err(CommitError::VersionMismatch { found: output.version, expected: OUTPUT_VERSION });
    }
    Ok(output)
}
