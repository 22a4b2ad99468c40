//! Period structure of a contest.

use crate::error::ConfigurationError;
use crate::models::GameClock;
use serde::{Deserialize, Serialize};

/// Fixed period lengths for regulation and overtime.
///
/// Overtime count is unbounded; it is read from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodRules {
    /// Number of regulation periods (4 quarters)
    pub regulation_periods: u8,
    /// Length of one regulation period in seconds
    pub regulation_seconds: u32,
    /// Length of one overtime period in seconds
    pub overtime_seconds: u32,
}

impl Default for PeriodRules {
    fn default() -> Self {
        Self { regulation_periods: 4, regulation_seconds: 720, overtime_seconds: 300 }
    }
}

impl PeriodRules {
    /// Forty-minute games (four 10-minute quarters, 5-minute overtime).
    pub fn fiba() -> Self {
        Self { regulation_periods: 4, regulation_seconds: 600, overtime_seconds: 300 }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.regulation_periods == 0 {
            return Err(ConfigurationError::InvalidRules(
                "at least one regulation period is required".to_string(),
            ));
        }
        if self.regulation_seconds == 0 || self.overtime_seconds == 0 {
            return Err(ConfigurationError::InvalidRules(
                "period lengths must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_overtime(&self, period: u8) -> bool {
        period > self.regulation_periods
    }

    /// Nominal length of `period` (1-based).
    pub fn period_seconds(&self, period: u8) -> u32 {
        if self.is_overtime(period) {
            self.overtime_seconds
        } else {
            self.regulation_seconds
        }
    }

    /// Nominal clock at which `period` (1-based) starts.
    pub fn period_start(&self, period: u8) -> GameClock {
        let period = period.max(1) as u32;
        let regulation = self.regulation_periods as u32;
        let secs = if period <= regulation {
            (period - 1) * self.regulation_seconds
        } else {
            regulation * self.regulation_seconds + (period - 1 - regulation) * self.overtime_seconds
        };
        GameClock::from_secs(secs)
    }

    /// Nominal clock at which `period` (1-based) ends.
    pub fn period_end(&self, period: u8) -> GameClock {
        self.period_start(period).saturating_add(GameClock::from_secs(self.period_seconds(period)))
    }

    /// Period label: `Q1`..`Q4` in regulation, `OT1`.. afterwards.
    pub fn period_label(&self, period: u8) -> String {
        if self.is_overtime(period) {
            format!("OT{}", period - self.regulation_periods)
        } else {
            format!("Q{}", period)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_boundaries() {
        let rules = PeriodRules::default();
        assert_eq!(rules.period_start(1), GameClock::ZERO);
        assert_eq!(rules.period_end(4), GameClock::from_secs(2880));
        assert_eq!(rules.period_start(5), GameClock::from_secs(2880));
        assert_eq!(rules.period_end(6), GameClock::from_secs(3480));
    }

    #[test]
    fn test_period_labels() {
        let rules = PeriodRules::default();
        assert_eq!(rules.period_label(2), "Q2");
        assert_eq!(rules.period_label(6), "OT2");
    }

    #[test]
    fn test_zero_length_rejected() {
        let rules = PeriodRules { overtime_seconds: 0, ..Default::default() };
        assert!(matches!(rules.validate(), Err(ConfigurationError::InvalidRules(_))));
    }
}
