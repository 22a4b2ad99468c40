//! Cumulative snapshot records
//!
//! A snapshot is the running-total box score line for one entity (player or
//! team) at one event of a contest. Snapshots are produced upstream and are
//! never mutated here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Tenths of a second per whole second.
pub const TICKS_PER_SECOND: u32 = 10;

/// Elapsed contest time, stored as integer tenths of a second.
///
/// Integer ticks keep decisecond windows exact and make snapshot lookups a
/// plain binary search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameClock(u32);

impl GameClock {
    pub const ZERO: GameClock = GameClock(0);

    pub const fn from_ticks(ticks: u32) -> Self {
        GameClock(ticks)
    }

    pub const fn from_secs(secs: u32) -> Self {
        GameClock(secs * TICKS_PER_SECOND)
    }

    /// `None` when `secs` does not fit in ticks.
    pub const fn checked_from_secs(secs: u32) -> Option<Self> {
        match secs.checked_mul(TICKS_PER_SECOND) {
            Some(ticks) => Some(GameClock(ticks)),
            None => None,
        }
    }

    /// Convert fractional seconds, rounding to the nearest tenth.
    ///
    /// Returns `None` for negative, non-finite or out-of-range input.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        let ticks = (secs * TICKS_PER_SECOND as f64).round();
        if ticks > u32::MAX as f64 {
            return None;
        }
        Some(GameClock(ticks as u32))
    }

    pub const fn ticks(self) -> u32 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / TICKS_PER_SECOND as f64
    }

    pub fn saturating_sub(self, other: GameClock) -> GameClock {
        GameClock(self.0.saturating_sub(other.0))
    }

    pub fn saturating_add(self, other: GameClock) -> GameClock {
        GameClock(self.0.saturating_add(other.0))
    }

    /// `mm:ss` (or `mm:ss.t` when not on a whole second) measured from `origin`.
    pub fn clock_label(self, origin: GameClock) -> String {
        let rel = self.saturating_sub(origin).0;
        let whole = rel / TICKS_PER_SECOND;
        let tenth = rel % TICKS_PER_SECOND;
        if tenth == 0 {
            format!("{:02}:{:02}", whole / 60, whole % 60)
        } else {
            format!("{:02}:{:02}.{}", whole / 60, whole % 60, tenth)
        }
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}s", self.as_secs_f64())
    }
}

/// Whether a snapshot row describes a player or a whole team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Team,
}

/// Fixed set of counting stats carried by every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub pts: u32,
    pub fgm: u32,
    pub fga: u32,
    pub fg3m: u32,
    pub fg3a: u32,
    pub ftm: u32,
    pub fta: u32,
    pub oreb: u32,
    pub dreb: u32,
    pub ast: u32,
    pub stl: u32,
    pub blk: u32,
    pub tov: u32,
    pub pf: u32,
    pub minutes: f64,
}

impl StatLine {
    /// `later - earlier` field by field.
    ///
    /// Negative differences are clamped to zero; the returned flag is `true`
    /// when any field had to be clamped.
    pub fn checked_delta(later: &StatLine, earlier: &StatLine) -> (StatLine, bool) {
        let mut clamped = false;
        let mut sub = |a: u32, b: u32| -> u32 {
            if a < b {
                clamped = true;
                0
            } else {
                a - b
            }
        };

        let mut delta = StatLine {
            pts: sub(later.pts, earlier.pts),
            fgm: sub(later.fgm, earlier.fgm),
            fga: sub(later.fga, earlier.fga),
            fg3m: sub(later.fg3m, earlier.fg3m),
            fg3a: sub(later.fg3a, earlier.fg3a),
            ftm: sub(later.ftm, earlier.ftm),
            fta: sub(later.fta, earlier.fta),
            oreb: sub(later.oreb, earlier.oreb),
            dreb: sub(later.dreb, earlier.dreb),
            ast: sub(later.ast, earlier.ast),
            stl: sub(later.stl, earlier.stl),
            blk: sub(later.blk, earlier.blk),
            tov: sub(later.tov, earlier.tov),
            pf: sub(later.pf, earlier.pf),
            minutes: 0.0,
        };

        let minutes = later.minutes - earlier.minutes;
        // Sub-millisecond float noise is not a correction artifact.
        if minutes < -1e-9 {
            clamped = true;
        }
        delta.minutes = minutes.max(0.0);

        (delta, clamped)
    }

    /// First field (by name) that decreased from `earlier` to `self`.
    pub fn first_decrease(&self, earlier: &StatLine) -> Option<&'static str> {
        let pairs = [
            ("pts", self.pts, earlier.pts),
            ("fgm", self.fgm, earlier.fgm),
            ("fga", self.fga, earlier.fga),
            ("fg3m", self.fg3m, earlier.fg3m),
            ("fg3a", self.fg3a, earlier.fg3a),
            ("ftm", self.ftm, earlier.ftm),
            ("fta", self.fta, earlier.fta),
            ("oreb", self.oreb, earlier.oreb),
            ("dreb", self.dreb, earlier.dreb),
            ("ast", self.ast, earlier.ast),
            ("stl", self.stl, earlier.stl),
            ("blk", self.blk, earlier.blk),
            ("tov", self.tov, earlier.tov),
            ("pf", self.pf, earlier.pf),
        ];
        if let Some((name, _, _)) = pairs.iter().find(|(_, now, before)| now < before) {
            return Some(name);
        }
        if self.minutes < earlier.minutes - 1e-9 {
            return Some("minutes");
        }
        None
    }

    pub fn reb(&self) -> u32 {
        self.oreb + self.dreb
    }

    /// No scoring and no shot attempts: a "quiet" interval.
    pub fn is_quiet(&self) -> bool {
        self.pts == 0 && self.fga == 0
    }
}

impl AddAssign<&StatLine> for StatLine {
    fn add_assign(&mut self, rhs: &StatLine) {
        self.pts += rhs.pts;
        self.fgm += rhs.fgm;
        self.fga += rhs.fga;
        self.fg3m += rhs.fg3m;
        self.fg3a += rhs.fg3a;
        self.ftm += rhs.ftm;
        self.fta += rhs.fta;
        self.oreb += rhs.oreb;
        self.dreb += rhs.dreb;
        self.ast += rhs.ast;
        self.stl += rhs.stl;
        self.blk += rhs.blk;
        self.tov += rhs.tov;
        self.pf += rhs.pf;
        self.minutes += rhs.minutes;
    }
}

/// One cumulative running-total row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub contest_id: String,
    pub event_number: u32,
    pub entity_id: String,
    pub entity_kind: EntityKind,
    /// Team the entity belongs to (equal to `entity_id` for team rows).
    pub team_id: String,
    pub period: u8,
    pub elapsed: GameClock,
    pub stats: StatLine,
    pub on_court: bool,
    /// Team in possession after this event, when the source provides it.
    #[serde(default)]
    pub possession_team_id: Option<String>,
}

impl Snapshot {
    pub fn is_player(&self) -> bool {
        self.entity_kind == EntityKind::Player
    }
}
