// Commit layer for completed contests
// MessagePack + LZ4 with a SHA-256 trailer, written atomically

pub mod error;
pub mod format;
pub mod sink;

pub use error::CommitError;
pub use format::{decode, encode, ContestDiagnostics, ContestOutput};
pub use sink::{FileSink, MemorySink, ResultSink};

pub const OUTPUT_VERSION: u32 = 1;
