// Data model: immutable cumulative snapshots in, flat result rows out.

pub mod contest;
pub mod records;
pub mod snapshot;

pub use contest::{ContestInput, ContestMeta, PlayerBio};
pub use records::{AttributionMethod, IntervalStat, LineupSnapshot, Possession, Stint};
pub use snapshot::{EntityKind, GameClock, Snapshot, StatLine, TICKS_PER_SECOND};
