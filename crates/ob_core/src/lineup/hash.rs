//! Canonical five-player lineup identity.
//!
//! Ids are sorted lexicographically and hashed with SHA-256, each id
//! length-prefixed so that no two distinct sets share an encoding. The hash
//! is therefore independent of input order and stable across runs.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const LINEUP_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lineup {
    players: Vec<String>,
    hash: String,
}

impl Lineup {
    /// Build a lineup from exactly five distinct player ids.
    pub fn new<S: AsRef<str>>(players: &[S]) -> Result<Self, ValidationError> {
        if players.len() != LINEUP_SIZE {
            return Err(ValidationError::LineupSize { found: players.len() });
        }

        let mut sorted: Vec<String> = players.iter().map(|p| p.as_ref().to_string()).collect();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(ValidationError::DuplicateLineupMember { player_id: pair[0].clone() });
        }

        let mut hasher = Sha256::new();
        for id in &sorted {
            hasher.update((id.len() as u32).to_le_bytes());
            hasher.update(id.as_bytes());
        }
        let hash = format!("{:x}", hasher.finalize());

        Ok(Self { players: sorted, hash })
    }

    /// Sorted player ids.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Hex SHA-256 digest of the sorted ids.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.binary_search_by(|p| p.as_str().cmp(player_id)).is_ok()
    }
}

/// Hash of a five-player set, independent of order.
pub fn lineup_hash<S: AsRef<str>>(players: &[S]) -> Result<String, ValidationError> {
    Lineup::new(players).map(|lineup| lineup.hash)
}
