//! # Analytics Configuration
//!
//! Every tunable of the interval and lineup pipeline lives here and is
//! passed into constructors explicitly; nothing reads ambient global state.
//!
//! ## Usage
//! ```rust
//! use ob_core::config::AnalyticsConfig;
//!
//! let config = AnalyticsConfig::default();
//! let clutch = AnalyticsConfig::clutch();
//! assert!(clutch.granularities.len() > config.granularities.len());
//! ```
//!
//! ## Environment Variables
//!
//! - `OB_CONFIG_PROFILE`: Select preset (standard, clutch)

mod batch_config;
mod rules_config;

pub use batch_config::{BatchConfig, MetricsConfig, PossessionConfig, SuspectPolicy};
pub use rules_config::PeriodRules;

use crate::analysis::partition::{ClockRange, Granularity};
use crate::error::ConfigurationError;
use crate::models::GameClock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub rules: PeriodRules,
    /// Window sets emitted for every contest
    pub granularities: Vec<Granularity>,
    /// Explicit decisecond ranges (never a whole contest)
    pub decisecond_ranges: Vec<ClockRange>,
    pub max_decisecond_span_seconds: u32,
    pub possession: PossessionConfig,
    pub metrics: MetricsConfig,
    /// Source team name -> canonical team id
    pub team_aliases: BTreeMap<String, String>,
    pub batch: BatchConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            rules: PeriodRules::default(),
            granularities: vec![
                Granularity::Period,
                Granularity::Regulation { window_seconds: 360 },
                Granularity::Regulation { window_seconds: 180 },
                Granularity::Regulation { window_seconds: 90 },
                Granularity::Regulation { window_seconds: 60 },
                Granularity::OvertimeHalves,
                Granularity::OvertimeMinutes,
            ],
            decisecond_ranges: Vec::new(),
            max_decisecond_span_seconds: 120,
            possession: PossessionConfig::default(),
            metrics: MetricsConfig::default(),
            team_aliases: BTreeMap::new(),
            batch: BatchConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Standard windows plus second-by-second windows for late-game work.
    pub fn clutch() -> Self {
        let mut cfg = Self::default();
        cfg.granularities.push(Granularity::Seconds);
        cfg
    }

    pub fn from_env_or_default() -> Self {
        match env::var("OB_CONFIG_PROFILE").unwrap_or_default().to_lowercase().as_str() {
            "clutch" => Self::clutch(),
            _ => Self::default(),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigurationError> {
        let cfg: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigurationError::Load(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|e| ConfigurationError::Load(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Load(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// Checks everything that can be rejected before processing starts.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.rules.validate()?;
        for granularity in &self.granularities {
            granularity.validate(&self.rules)?;
        }
        if self.possession.bucket_size == 0 {
            return Err(ConfigurationError::ZeroBucketSize);
        }
        let span = self.max_decisecond_span_seconds;
        if span == 0 || GameClock::checked_from_secs(span).is_none() {
            return Err(ConfigurationError::DecisecondSpanLimit(span));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AnalyticsConfig::default();
        assert_eq!(cfg.rules.regulation_seconds, 720);
        assert_eq!(cfg.possession.bucket_size, 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_clutch_adds_seconds() {
        assert!(AnalyticsConfig::clutch().granularities.contains(&Granularity::Seconds));
        assert!(!AnalyticsConfig::standard().granularities.contains(&Granularity::Seconds));
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = r#"
rules:
  overtime_seconds: 240
possession:
  bucket_size: 6
team_aliases:
  "Los Angeles Lakers": LAL
batch:
  workers: 2
  suspect_policy: skip
"#;
        let cfg = AnalyticsConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.rules.overtime_seconds, 240);
        assert_eq!(cfg.rules.regulation_seconds, 720);
        assert_eq!(cfg.possession.bucket_size, 6);
        assert_eq!(cfg.team_aliases.get("Los Angeles Lakers").map(String::as_str), Some("LAL"));
        assert_eq!(cfg.batch.suspect_policy, SuspectPolicy::Skip);
    }

    #[test]
    fn test_yaml_bad_window_rejected() {
        let yaml = r#"
granularities:
  - kind: regulation
    window_seconds: 50
"#;
        assert!(matches!(
            AnalyticsConfig::from_yaml_str(yaml),
            Err(ConfigurationError::WindowDoesNotDividePeriod { window_seconds: 50, .. })
        ));
    }

    #[test]
    fn test_decisecond_span_limit_validated() {
        let mut cfg = AnalyticsConfig::default();
        cfg.max_decisecond_span_seconds = u32::MAX;
        assert!(matches!(cfg.validate(), Err(ConfigurationError::DecisecondSpanLimit(_))));
        cfg.max_decisecond_span_seconds = 0;
        assert!(matches!(cfg.validate(), Err(ConfigurationError::DecisecondSpanLimit(0))));
        cfg.max_decisecond_span_seconds = 300;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let cfg = AnalyticsConfig::clutch();
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed = AnalyticsConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, cfg);
    }
}
