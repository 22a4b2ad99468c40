use crate::commit::CommitError;
use thiserror::Error;

/// A single unit of work was malformed. Logged and skipped by callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Lineup must have exactly 5 players, found {found}")]
    LineupSize { found: usize },

    #[error("Lineup lists player {player_id} more than once")]
    DuplicateLineupMember { player_id: String },

    #[error("Malformed window bounds: start {start_ticks} must be before end {end_ticks} (tenths of a second)")]
    MalformedWindow { start_ticks: u32, end_ticks: u32 },

    #[error("Decisecond range of {span_seconds:.1}s exceeds the {max_seconds}s limit")]
    DecisecondSpanTooLarge { span_seconds: f64, max_seconds: u32 },

    #[error("Timestamp precedes reference date {date}")]
    TimestampBeforeDate { date: String },

    #[error("No snapshots for entity {entity_id} in contest {contest_id}")]
    UnknownEntity { contest_id: String, entity_id: String },

    #[error("Contest {contest_id} is missing metadata")]
    MissingContestMeta { contest_id: String },
}

/// Invalid setup detected before any processing begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Window of {window_seconds}s does not evenly divide the {period_seconds}s period")]
    WindowDoesNotDividePeriod { window_seconds: u32, period_seconds: u32 },

    #[error("Window size must be greater than zero")]
    ZeroWindow,

    #[error("Invalid period rules: {0}")]
    InvalidRules(String),

    #[error("Possession bucket size must be greater than zero")]
    ZeroBucketSize,

    #[error("Decisecond span limit of {0}s is out of range")]
    DecisecondSpanLimit(u32),

    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Data-quality symptom recovered locally by a documented convention.
///
/// These are recorded on rows and diagnostics, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataQualityWarning {
    /// A cumulative field decreased; the delta was clamped to zero.
    NegativeDeltaClamped,
    /// A repeated (contest, event, entity) key; the first row was kept.
    DuplicateSnapshotKey,
    /// No snapshot preceded the window start; zero baseline assumed.
    MissingBaseline,
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

impl AnalyticsError {
    /// Whether the failure is limited to one unit of work.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AnalyticsError::Validation(_) => true,
            AnalyticsError::Configuration(_) => false,
            AnalyticsError::Commit(err) => err.is_recoverable(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = ConfigurationError::WindowDoesNotDividePeriod {
            window_seconds: 50,
            period_seconds: 720,
        };
        assert_eq!(err.to_string(), "Window of 50s does not evenly divide the 720s period");
        assert_eq!(
            ValidationError::LineupSize { found: 4 }.to_string(),
            "Lineup must have exactly 5 players, found 4"
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(AnalyticsError::from(ValidationError::LineupSize { found: 6 }).is_recoverable());
        assert!(!AnalyticsError::from(ConfigurationError::ZeroWindow).is_recoverable());
    }
}
