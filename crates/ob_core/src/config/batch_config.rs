use serde::{Deserialize, Serialize};

/// What to do with a contest whose output carries suspect (clamped) rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuspectPolicy {
    /// Commit the contest; suspect rows stay flagged.
    #[default]
    Commit,
    /// Do not commit; report the contest as skipped for suspect data.
    Skip,
}

/// Cross-contest worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads (0 = rayon default)
    pub workers: usize,
    /// Attempts per contest before it is reported as failed
    pub max_attempts: u32,
    pub suspect_policy: SuspectPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 0, max_attempts: 1, suspect_policy: SuspectPolicy::Commit }
    }
}

/// Possession attribution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PossessionConfig {
    /// Events per bucket for the fixed-bucket approximation
    pub bucket_size: usize,
    /// Use explicit possession-change signals when the contest carries them
    pub prefer_explicit: bool,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self { bucket_size: 4, prefer_explicit: true }
    }
}

/// Tunables for derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Per-100 game score subtracted to centre the box composite
    pub bpm_baseline: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { bpm_baseline: 0.0 }
    }
}
