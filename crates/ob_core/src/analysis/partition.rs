//! # Interval Partitioner
//!
//! Generates the ordered window set for a granularity over the periods a
//! contest actually played.
//!
//! | Granularity | Applies to | Window |
//! |-------------|------------|--------|
//! | `Game` | whole contest | one window |
//! | `Period` | every period | one per period |
//! | `Regulation { w }` | regulation | `w` seconds, must divide the period |
//! | `OvertimeHalves` | overtime | half an overtime period |
//! | `OvertimeMinutes` | overtime | 60 seconds |
//! | `Seconds` | every period | 1 second |
//! | `Deciseconds(range)` | explicit range only | 0.1 second |
//!
//! A period that ended early truncates its last window; no zero-length or
//! out-of-range window is ever emitted.

use crate::config::PeriodRules;
use crate::error::{AnalyticsError, ConfigurationError, ValidationError};
use crate::models::{GameClock, TICKS_PER_SECOND};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A caller-supplied `[start, end)` range in seconds of elapsed contest time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl ClockRange {
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self { start_seconds, end_seconds }
    }

    /// Resolve to clock bounds, rejecting empty, inverted or negative ranges.
    pub fn to_clocks(&self) -> Result<(GameClock, GameClock), ValidationError> {
        let start = GameClock::from_secs_f64(self.start_seconds);
        let end = GameClock::from_secs_f64(self.end_seconds);
        match (start, end) {
            (Some(start), Some(end)) if start < end => Ok((start, end)),
            _ => Err(ValidationError::MalformedWindow {
                start_ticks: start.map(GameClock::ticks).unwrap_or(0),
                end_ticks: end.map(GameClock::ticks).unwrap_or(0),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Granularity {
    Game,
    Period,
    Regulation { window_seconds: u32 },
    OvertimeHalves,
    OvertimeMinutes,
    Seconds,
    Deciseconds(ClockRange),
}

impl Granularity {
    /// Short stable name used to tag output rows.
    pub fn set_name(&self) -> String {
        match self {
            Granularity::Game => "game".to_string(),
            Granularity::Period => "period".to_string(),
            Granularity::Regulation { window_seconds } => format!("reg_{}s", window_seconds),
            Granularity::OvertimeHalves => "ot_halves".to_string(),
            Granularity::OvertimeMinutes => "ot_minutes".to_string(),
            Granularity::Seconds => "seconds".to_string(),
            Granularity::Deciseconds(_) => "deciseconds".to_string(),
        }
    }

    /// Configuration-level checks that do not depend on contest data.
    pub fn validate(&self, rules: &PeriodRules) -> Result<(), ConfigurationError> {
        if let Granularity::Regulation { window_seconds } = *self {
            if window_seconds == 0 {
                return Err(ConfigurationError::ZeroWindow);
            }
            if rules.regulation_seconds % window_seconds != 0 {
                return Err(ConfigurationError::WindowDoesNotDividePeriod {
                    window_seconds,
                    period_seconds: rules.regulation_seconds,
                });
            }
        }
        Ok(())
    }
}

/// One period as it was actually played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedPeriod {
    pub period: u8,
    pub start: GameClock,
    pub end: GameClock,
}

impl PlayedPeriod {
    pub fn duration(&self) -> GameClock {
        self.end.saturating_sub(self.start)
    }
}

/// Derive played periods from the latest clock observed in each period.
///
/// Every period up to the last observed one is considered played, and
/// regulation periods always run their full length so quiet stretches at the
/// end of a log still get windows. Only a final overtime period can end
/// early: it stops at the last observed clock when that is before its
/// nominal end. A final period with no elapsed time is dropped.
pub fn played_periods(rules: &PeriodRules, extents: &BTreeMap<u8, GameClock>) -> Vec<PlayedPeriod> {
    let Some((&last, &last_seen)) = extents.iter().next_back() else {
        return Vec::new();
    };

    let mut periods = Vec::with_capacity(last as usize);
    for period in 1..=last {
        let start = rules.period_start(period);
        let mut end = rules.period_end(period);
        if period == last && rules.is_overtime(period) {
            end = end.min(last_seen);
        }
        if end > start {
            periods.push(PlayedPeriod { period, start, end });
        }
    }
    periods
}

/// Nominal periods of a completed contest with `overtimes` extra periods.
pub fn full_contest(rules: &PeriodRules, overtimes: u8) -> Vec<PlayedPeriod> {
    (1..=rules.regulation_periods + overtimes)
        .map(|period| PlayedPeriod {
            period,
            start: rules.period_start(period),
            end: rules.period_end(period),
        })
        .collect()
}

/// A `[start, end)` span of elapsed contest time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalWindow {
    /// Granularity the window belongs to (`reg_360s`, `seconds`, ...)
    pub set: String,
    /// Period the window lies in; 0 for whole-contest windows
    pub period: u8,
    /// Position within its period (or contest), starting at 0
    pub index: u32,
    pub start: GameClock,
    pub end: GameClock,
    pub label: String,
}

impl IntervalWindow {
    pub fn duration(&self) -> GameClock {
        self.end.saturating_sub(self.start)
    }

    pub fn minutes(&self) -> f64 {
        self.duration().as_secs_f64() / 60.0
    }
}

#[derive(Debug, Clone)]
pub struct IntervalPartitioner {
    rules: PeriodRules,
    granularity: Granularity,
    decisecond_bounds: Option<(GameClock, GameClock)>,
}

impl IntervalPartitioner {
    /// Validate the granularity against the rules.
    ///
    /// Regulation windows that do not divide the period fail with a
    /// `ConfigurationError`; malformed or oversized decisecond ranges fail
    /// with a `ValidationError`.
    pub fn new(
        rules: PeriodRules,
        granularity: Granularity,
        max_decisecond_span_seconds: u32,
    ) -> Result<Self, AnalyticsError> {
        rules.validate()?;
        granularity.validate(&rules)?;

        let decisecond_bounds = match granularity {
            Granularity::Deciseconds(range) => {
                let (start, end) = range.to_clocks()?;
                let span = end.saturating_sub(start);
                let too_wide = GameClock::checked_from_secs(max_decisecond_span_seconds)
                    .map_or(false, |limit| span > limit);
                if too_wide {
                    return Err(ValidationError::DecisecondSpanTooLarge {
                        span_seconds: span.as_secs_f64(),
                        max_seconds: max_decisecond_span_seconds,
                    }
                    .into());
                }
                Some((start, end))
            }
            _ => None,
        };

        Ok(Self { rules, granularity, decisecond_bounds })
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Ordered windows over `played` (ascending by start).
    pub fn partition(&self, played: &[PlayedPeriod]) -> Vec<IntervalWindow> {
        let set = self.granularity.set_name();
        let regulation = |p: &&PlayedPeriod| !self.rules.is_overtime(p.period);
        let overtime = |p: &&PlayedPeriod| self.rules.is_overtime(p.period);

        match self.granularity {
            Granularity::Game => {
                let (Some(first), Some(last)) = (played.first(), played.last()) else {
                    return Vec::new();
                };
                vec![IntervalWindow {
                    set,
                    period: 0,
                    index: 0,
                    start: first.start,
                    end: last.end,
                    label: "GAME".to_string(),
                }]
            }
            Granularity::Period => played
                .iter()
                .map(|p| IntervalWindow {
                    set: set.clone(),
                    period: p.period,
                    index: 0,
                    start: p.start,
                    end: p.end,
                    label: self.rules.period_label(p.period),
                })
                .collect(),
            Granularity::Regulation { window_seconds } => {
                let step = GameClock::from_secs(window_seconds);
                played.iter().filter(regulation).flat_map(|p| self.stepped(&set, p, step)).collect()
            }
            Granularity::OvertimeHalves => {
                let step = GameClock::from_ticks(self.rules.overtime_seconds * TICKS_PER_SECOND / 2);
                played.iter().filter(overtime).flat_map(|p| self.stepped(&set, p, step)).collect()
            }
            Granularity::OvertimeMinutes => {
                let step = GameClock::from_secs(60);
                played.iter().filter(overtime).flat_map(|p| self.stepped(&set, p, step)).collect()
            }
            Granularity::Seconds => {
                let step = GameClock::from_secs(1);
                played.iter().flat_map(|p| self.stepped(&set, p, step)).collect()
            }
            Granularity::Deciseconds(_) => {
                let Some((start, end)) = self.decisecond_bounds else {
                    return Vec::new();
                };
                let step = GameClock::from_ticks(1);
                played
                    .iter()
                    .filter_map(|p| {
                        let lo = p.start.max(start);
                        let hi = p.end.min(end);
                        (lo < hi).then_some(PlayedPeriod { period: p.period, start: lo, end: hi })
                    })
                    .flat_map(|clip| {
                        let origin = self.rules.period_start(clip.period);
                        self.stepped_from(&set, &clip, step, origin)
                    })
                    .collect()
            }
        }
    }

    fn stepped(&self, set: &str, period: &PlayedPeriod, step: GameClock) -> Vec<IntervalWindow> {
        self.stepped_from(set, period, step, period.start)
    }

    /// Fixed steps from `span.start`, truncating the last window at `span.end`.
    fn stepped_from(
        &self,
        set: &str,
        span: &PlayedPeriod,
        step: GameClock,
        origin: GameClock,
    ) -> Vec<IntervalWindow> {
        let mut windows = Vec::new();
        if step == GameClock::ZERO {
            return windows;
        }
        let period_label = self.rules.period_label(span.period);
        let mut start = span.start;
        let mut index = 0u32;
        while start < span.end {
            let end = start.saturating_add(step).min(span.end);
            windows.push(IntervalWindow {
                set: set.to_string(),
                period: span.period,
                index,
                start,
                end,
                label: format!(
                    "{} {}-{}",
                    period_label,
                    start.clock_label(origin),
                    end.clock_label(origin)
                ),
            });
            start = end;
            index += 1;
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partitioner(granularity: Granularity) -> IntervalPartitioner {
        IntervalPartitioner::new(PeriodRules::default(), granularity, 120).unwrap()
    }

    fn regulation_game() -> Vec<PlayedPeriod> {
        full_contest(&PeriodRules::default(), 0)
    }

    #[test]
    fn test_fixed_width_window_counts() {
        for (secs, per_period) in [(360, 2), (180, 4), (90, 8), (60, 12)] {
            let windows = partitioner(Granularity::Regulation { window_seconds: secs })
                .partition(&regulation_game());
            assert_eq!(windows.len(), per_period * 4, "window {}s", secs);
            assert_eq!(windows.iter().filter(|w| w.period == 1).count(), per_period);
        }
    }

    #[test]
    fn test_ninety_second_windows_per_period() {
        let windows =
            partitioner(Granularity::Regulation { window_seconds: 90 }).partition(&regulation_game());
        assert_eq!(windows.len(), 32);
        assert_eq!(windows[0].start, GameClock::ZERO);
        assert_eq!(windows[0].end, GameClock::from_secs(90));
        assert_eq!(windows[0].label, "Q1 00:00-01:30");
        assert_eq!(windows[31].end, GameClock::from_secs(2880));
    }

    #[test]
    fn test_non_dividing_window_is_configuration_error() {
        let err = IntervalPartitioner::new(
            PeriodRules::default(),
            Granularity::Regulation { window_seconds: 50 },
            120,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Configuration(ConfigurationError::WindowDoesNotDividePeriod {
                window_seconds: 50,
                period_seconds: 720
            })
        ));
        assert!(matches!(
            IntervalPartitioner::new(
                PeriodRules::default(),
                Granularity::Regulation { window_seconds: 0 },
                120
            ),
            Err(AnalyticsError::Configuration(ConfigurationError::ZeroWindow))
        ));
    }

    #[test]
    fn test_overtime_windows() {
        let played = full_contest(&PeriodRules::default(), 2);
        let halves = partitioner(Granularity::OvertimeHalves).partition(&played);
        assert_eq!(halves.len(), 4);
        assert_eq!(halves[0].start, GameClock::from_secs(2880));
        assert_eq!(halves[0].end, GameClock::from_secs(3030));
        assert_eq!(halves[0].label, "OT1 00:00-02:30");

        let minutes = partitioner(Granularity::OvertimeMinutes).partition(&played);
        assert_eq!(minutes.len(), 10);
        assert!(minutes.iter().all(|w| w.duration() == GameClock::from_secs(60)));

        // Regulation windows never cover overtime
        let reg = partitioner(Granularity::Regulation { window_seconds: 360 }).partition(&played);
        assert_eq!(reg.len(), 8);
    }

    #[test]
    fn test_short_overtime_truncates_last_window() {
        let rules = PeriodRules::default();
        let mut extents = BTreeMap::new();
        extents.insert(4, GameClock::from_secs(2880));
        extents.insert(5, GameClock::from_secs(2880 + 200));
        let played = played_periods(&rules, &extents);
        assert_eq!(played.len(), 5);
        assert_eq!(played[4].duration(), GameClock::from_secs(200));

        let minutes = partitioner(Granularity::OvertimeMinutes).partition(&played);
        assert_eq!(minutes.len(), 4);
        assert_eq!(minutes[3].duration(), GameClock::from_secs(20));
        assert_eq!(minutes[3].end, GameClock::from_secs(3080));

        let halves = partitioner(Granularity::OvertimeHalves).partition(&played);
        assert_eq!(halves.len(), 2);
        assert_eq!(halves[1].duration(), GameClock::from_secs(50));
    }

    #[test]
    fn test_seconds_bounded_to_played_periods() {
        let played = full_contest(&PeriodRules::default(), 1);
        let seconds = partitioner(Granularity::Seconds).partition(&played);
        assert_eq!(seconds.len(), 4 * 720 + 300);
        assert_eq!(seconds.iter().filter(|w| w.period == 5).count(), 300);
        assert!(seconds.windows(2).all(|pair| pair[0].end == pair[1].start));
    }

    #[test]
    fn test_deciseconds_require_explicit_range() {
        let played = regulation_game();
        let p = partitioner(Granularity::Deciseconds(ClockRange::new(2873.0, 2874.0)));
        let windows = p.partition(&played);
        assert_eq!(windows.len(), 10);
        assert_eq!(windows[0].start, GameClock::from_secs(2873));
        assert_eq!(windows[9].end, GameClock::from_secs(2874));
        assert_eq!(windows[0].label, "Q4 11:53-11:53.1");
    }

    #[test]
    fn test_decisecond_range_clipped_to_played_time() {
        let played = regulation_game();
        let p = partitioner(Granularity::Deciseconds(ClockRange::new(2879.5, 2890.0)));
        assert_eq!(p.partition(&played).len(), 5);
    }

    #[test]
    fn test_malformed_decisecond_ranges() {
        let rules = PeriodRules::default();
        assert!(matches!(
            IntervalPartitioner::new(rules, Granularity::Deciseconds(ClockRange::new(10.0, 10.0)), 120),
            Err(AnalyticsError::Validation(ValidationError::MalformedWindow { .. }))
        ));
        assert!(matches!(
            IntervalPartitioner::new(rules, Granularity::Deciseconds(ClockRange::new(-1.0, 10.0)), 120),
            Err(AnalyticsError::Validation(ValidationError::MalformedWindow { .. }))
        ));
        assert!(matches!(
            IntervalPartitioner::new(rules, Granularity::Deciseconds(ClockRange::new(0.0, 721.0)), 120),
            Err(AnalyticsError::Validation(ValidationError::DecisecondSpanTooLarge { .. }))
        ));
    }

    #[test]
    fn test_huge_span_limit_does_not_overflow() {
        let p = IntervalPartitioner::new(
            PeriodRules::default(),
            Granularity::Deciseconds(ClockRange::new(0.0, 1.0)),
            u32::MAX,
        )
        .unwrap();
        assert_eq!(p.partition(&regulation_game()).len(), 10);
    }

    #[test]
    fn test_game_and_period_windows() {
        let played = full_contest(&PeriodRules::default(), 1);
        let game = partitioner(Granularity::Game).partition(&played);
        assert_eq!(game.len(), 1);
        assert_eq!(game[0].end, GameClock::from_secs(3180));
        let periods = partitioner(Granularity::Period).partition(&played);
        assert_eq!(periods.iter().map(|w| w.label.as_str()).collect::<Vec<_>>(), ["Q1", "Q2", "Q3", "Q4", "OT1"]);
    }

    #[test]
    fn test_played_periods_partial_game() {
        let rules = PeriodRules::default();
        let mut extents = BTreeMap::new();
        extents.insert(1, GameClock::from_secs(700));
        extents.insert(2, GameClock::from_secs(1000));
        let played = played_periods(&rules, &extents);
        assert_eq!(played.len(), 2);
        assert_eq!(played[0].end, GameClock::from_secs(720));
        assert_eq!(played[1].end, GameClock::from_secs(1440));
        assert!(played_periods(&rules, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_quiet_end_of_regulation_keeps_full_windows() {
        let rules = PeriodRules::default();
        let mut extents = BTreeMap::new();
        extents.insert(1, GameClock::ZERO);
        extents.insert(4, GameClock::from_secs(2700));
        let played = played_periods(&rules, &extents);
        assert_eq!(played.len(), 4);
        assert_eq!(played[3].end, GameClock::from_secs(2880));

        let reg60 = partitioner(Granularity::Regulation { window_seconds: 60 }).partition(&played);
        assert_eq!(reg60.len(), 48);
        assert_eq!(reg60.last().map(|w| w.end), Some(GameClock::from_secs(2880)));

        let seconds = partitioner(Granularity::Seconds).partition(&played);
        assert_eq!(seconds.iter().filter(|w| w.period == 4).count(), 720);
    }
}
