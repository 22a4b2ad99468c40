//! # Age and Experience
//!
//! Multi-encoding age at an arbitrary timestamp. A birth date has day
//! precision only, so the birth instant is taken as midnight UTC and the
//! result carries a bound for the unknown time of day: the true age lies in
//! `(seconds - 24h, seconds]`.
//!
//! All encodings derive from one duration in whole seconds, so
//! `seconds / 86400 == days` (floored) and `days / 365.25 ≈ years`.

use crate::error::ValidationError;
use crate::models::PlayerBio;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const DAYS_PER_YEAR: f64 = 365.25;
pub const SECONDS_PER_YEAR: f64 = DAYS_PER_YEAR * SECONDS_PER_DAY as f64;
/// Width of the unknown birth time-of-day window.
pub const BIRTH_TIME_UNCERTAINTY_HOURS: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeResult {
    /// Continuous age in years (seconds / 365.25 days)
    pub years: f64,
    pub days: i64,
    pub seconds: i64,
    pub uncertainty_hours: f64,
    /// Youngest the person can be given the unknown birth time
    pub min_years: f64,
    /// Oldest the person can be (born at midnight)
    pub max_years: f64,
    /// e.g. `26 years, 143 days`
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceResult {
    pub years: f64,
    pub days: i64,
    /// Less than one full season's elapsed time since debut
    pub is_rookie: bool,
}

/// Age and tenure features attached to interval rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerFeatures {
    pub age_years: Option<f64>,
    pub age_min_years: Option<f64>,
    pub age_max_years: Option<f64>,
    pub experience_years: Option<f64>,
    pub is_rookie: Option<bool>,
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn elapsed_seconds(since: NaiveDate, at: DateTime<Utc>) -> Result<i64, ValidationError> {
    let seconds = (at - midnight_utc(since)).num_seconds();
    if seconds < 0 {
        return Err(ValidationError::TimestampBeforeDate { date: since.to_string() });
    }
    Ok(seconds)
}

/// Whole calendar years and leftover days between two dates.
fn calendar_parts(birth: NaiveDate, on: NaiveDate) -> (i32, i64) {
    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    // Feb 29 birthdays fall back to Mar 1 in common years
    let anniversary = NaiveDate::from_ymd_opt(birth.year() + years, birth.month(), birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(birth.year() + years, 3, 1))
        .unwrap_or(birth);
    (years.max(0), (on - anniversary).num_days().max(0))
}

pub fn age_at(birth_date: NaiveDate, at: DateTime<Utc>) -> Result<AgeResult, ValidationError> {
    let seconds = elapsed_seconds(birth_date, at)?;
    let uncertainty_secs = (BIRTH_TIME_UNCERTAINTY_HOURS * 3600.0) as i64;
    let (whole_years, extra_days) = calendar_parts(birth_date, at.date_naive());

    Ok(AgeResult {
        years: seconds as f64 / SECONDS_PER_YEAR,
        days: seconds / SECONDS_PER_DAY,
        seconds,
        uncertainty_hours: BIRTH_TIME_UNCERTAINTY_HOURS,
        min_years: (seconds - uncertainty_secs).max(0) as f64 / SECONDS_PER_YEAR,
        max_years: seconds as f64 / SECONDS_PER_YEAR,
        display: format!("{} years, {} days", whole_years, extra_days),
    })
}

pub fn nba_experience_at(debut_date: NaiveDate, at: DateTime<Utc>) -> Result<ExperienceResult, ValidationError> {
    let seconds = elapsed_seconds(debut_date, at)?;
    let years = seconds as f64 / SECONDS_PER_YEAR;
    Ok(ExperienceResult { years, days: seconds / SECONDS_PER_DAY, is_rookie: years < 1.0 })
}

/// Features for a player at `at`; `None` when no date in the bio applies.
pub fn career_features(bio: &PlayerBio, at: DateTime<Utc>) -> Option<CareerFeatures> {
    let age = bio.birth_date.and_then(|d| age_at(d, at).ok());
    let experience = bio.debut_date.and_then(|d| nba_experience_at(d, at).ok());
    if age.is_none() && experience.is_none() {
        return None;
    }
    Some(CareerFeatures {
        age_years: age.as_ref().map(|a| a.years),
        age_min_years: age.as_ref().map(|a| a.min_years),
        age_max_years: age.as_ref().map(|a| a.max_years),
        experience_years: experience.map(|e| e.years),
        is_rookie: experience.map(|e| e.is_rookie),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_encodings_are_consistent() {
        let age = age_at(date(1998, 3, 14), at(2024, 11, 2, 0)).unwrap();
        assert_eq!(age.days, age.seconds / 86_400);
        assert!((age.seconds as f64 / 86_400.0 - age.days as f64).abs() < 1.0);
        assert!((age.days as f64 / DAYS_PER_YEAR - age.years).abs() < 1.0 / DAYS_PER_YEAR);
        assert!(age.min_years < age.years);
        assert_eq!(age.max_years, age.years);
        assert!((age.years - age.min_years) * SECONDS_PER_YEAR - 86_400.0 < 1e-6);
        assert_eq!(age.uncertainty_hours, 24.0);
    }

    #[test]
    fn test_display_uses_calendar_years() {
        let age = age_at(date(2000, 1, 10), at(2024, 1, 12, 20)).unwrap();
        assert_eq!(age.display, "24 years, 2 days");
        let leap = age_at(date(2000, 2, 29), at(2023, 3, 3, 0)).unwrap();
        assert_eq!(leap.display, "23 years, 2 days");
    }

    #[test]
    fn test_timestamp_before_birth_rejected() {
        assert!(matches!(
            age_at(date(2001, 5, 5), at(2000, 1, 1, 0)),
            Err(ValidationError::TimestampBeforeDate { .. })
        ));
    }

    #[test]
    fn test_experience_and_rookie_flag() {
        let rookie = nba_experience_at(date(2023, 10, 24), at(2024, 3, 1, 0)).unwrap();
        assert!(rookie.is_rookie);
        assert!(rookie.years < 1.0);
        let vet = nba_experience_at(date(2015, 10, 28), at(2024, 3, 1, 0)).unwrap();
        assert!(!vet.is_rookie);
        assert!((vet.years - vet.days as f64 / DAYS_PER_YEAR).abs() < 1.0 / DAYS_PER_YEAR);
    }

    #[test]
    fn test_career_features_from_bio() {
        let bio = PlayerBio {
            player_id: "p1".to_string(),
            birth_date: Some(date(1999, 6, 1)),
            ..Default::default()
        };
        let features = career_features(&bio, at(2024, 6, 1, 12)).unwrap();
        assert!(features.age_years.unwrap() > 24.9);
        assert!(features.experience_years.is_none());
        let empty = PlayerBio { player_id: "p2".to_string(), ..Default::default() };
        assert!(career_features(&empty, at(2024, 6, 1, 12)).is_none());
    }
}

#[cfg(all(test, feature = "proptest"))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: every encoding derives from the same duration
        #[test]
        fn prop_age_encodings_consistent(days_old in 0i64..40_000, secs_into_day in 0i64..86_400) {
            let birth = NaiveDate::from_ymd_opt(1960, 1, 1).unwrap();
            let at = midnight_utc(birth)
                + chrono::Duration::days(days_old)
                + chrono::Duration::seconds(secs_into_day);
            let age = age_at(birth, at).unwrap();
            prop_assert_eq!(age.days, days_old);
            prop_assert!((age.days as f64 / DAYS_PER_YEAR - age.years).abs() <= 1.0 / DAYS_PER_YEAR);
            prop_assert!(age.min_years <= age.years && age.years <= age.max_years);
        }
    }
}
