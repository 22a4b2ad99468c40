use std::path::PathBuf;
use thiserror::Error;

/// Failures while writing or reading back a committed contest output.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode contest output: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Failed to decode contest output: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("LZ4 payload is invalid: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    #[error("Committed output is {len} bytes, too short for a size header and checksum")]
    Truncated { len: usize },

    #[error("Checksum mismatch in committed output")]
    ChecksumMismatch,

    #[error("Output format version {found} is not readable (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("No committed output at {}", path.display())]
    Missing { path: PathBuf },

    #[error("Result sink unavailable: {0}")]
    SinkUnavailable(String),
}

impl CommitError {
    /// Transient sink and filesystem failures; a bad payload stays bad.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CommitError::Io(_) | CommitError::Missing { .. } | CommitError::SinkUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_transient_failures_are_recoverable() {
        assert!(CommitError::Io(io::Error::new(io::ErrorKind::Other, "disk full")).is_recoverable());
        assert!(CommitError::Missing { path: PathBuf::from("out/g1.obr") }.is_recoverable());
        assert!(CommitError::SinkUnavailable("lock poisoned".to_string()).is_recoverable());
    }

    #[test]
    fn test_bad_payloads_are_not_recoverable() {
        assert!(!CommitError::ChecksumMismatch.is_recoverable());
        assert!(!CommitError::Truncated { len: 3 }.is_recoverable());
        assert!(!CommitError::VersionMismatch { found: 2, expected: 1 }.is_recoverable());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = CommitError::Missing { path: PathBuf::from("out/g1.obr") };
        assert_eq!(err.to_string(), "No committed output at out/g1.obr");
        assert!(CommitError::Truncated { len: 3 }.to_string().contains("3 bytes"));
    }
}
