use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use once_cell::sync::Lazy;

use crate::error::LedgerError;
use crate::model::attendance::{Status, parse_civil_time};

pub static DEFAULT_HALF_DAY_FROM: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(11, 30, 0).unwrap_or(NaiveTime::MIN));
pub static DEFAULT_MINI_HALF_DAY_FROM: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(10, 30, 0).unwrap_or(NaiveTime::MIN));
pub static DEFAULT_FULL_DAY_UNTIL: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN));

/// Thresholds turning a check-in/check-out pair into a [`Status`].
///
/// A time equal to a threshold falls into the stricter bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRules {
    /// Check-in at or after this is a half day.
    pub half_day_from: NaiveTime,
    /// Check-in at or after this (but before `half_day_from`) is a mini half day.
    pub mini_half_day_from: NaiveTime,
    /// Check-out before this turns an otherwise present day into a half day.
    pub full_day_until: NaiveTime,
    /// When set, any check-in at or after this is forced to a half day.
    pub late_check_in_cutoff: Option<NaiveTime>,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self {
            half_day_from: *DEFAULT_HALF_DAY_FROM,
            mini_half_day_from: *DEFAULT_MINI_HALF_DAY_FROM,
            full_day_until: *DEFAULT_FULL_DAY_UNTIL,
            late_check_in_cutoff: None,
        }
    }
}

impl StatusRules {
    pub fn derive(&self, check_in: NaiveTime, check_out: Option<NaiveTime>) -> Status {
        if self.late_check_in_cutoff.is_some_and(|cutoff| check_in >= cutoff) {
            return Status::HalfDay;
        }
        if check_in >= self.half_day_from {
            Status::HalfDay
        } else if check_in >= self.mini_half_day_from {
            Status::MiniHalfDay
        } else if check_out.is_some_and(|out| out < self.full_day_until) {
            Status::HalfDay
        } else {
            Status::Present
        }
    }

    /// Same as [`StatusRules::derive`] over raw `HH:MM:SS` strings.
    pub fn derive_str(&self, check_in: &str, check_out: Option<&str>) -> Result<Status, LedgerError> {
        let check_in = parse_civil_time(check_in)?;
        let check_out = check_out.map(parse_civil_time).transpose()?;
        Ok(self.derive(check_in, check_out))
    }
}

/// Days of the week skipped when a leave range is materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekendPolicy {
    days: Vec<Weekday>,
}

impl Default for WeekendPolicy {
    fn default() -> Self {
        Self {
            days: vec![Weekday::Sat, Weekday::Sun],
        }
    }
}

impl WeekendPolicy {
    pub fn new(days: Vec<Weekday>) -> Self {
        Self { days }
    }

    /// Parses a comma separated list such as `Sat,Sun`.
    pub fn parse(list: &str) -> Result<Self, String> {
        let days = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Weekday>().map_err(|_| format!("unknown weekday {s:?}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { days })
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.days.contains(&date.weekday())
    }

    /// Non-weekend dates in `start..=end`.
    pub fn working_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !self.is_weekend(*d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn check_in_only_buckets() {
        let rules = StatusRules::default();
        assert_eq!(rules.derive(t(9, 15), None), Status::Present);
        assert_eq!(rules.derive(t(10, 45), None), Status::MiniHalfDay);
        assert_eq!(rules.derive(t(11, 40), None), Status::HalfDay);
    }

    #[test]
    fn thresholds_are_inclusive_of_the_stricter_bucket() {
        let rules = StatusRules::default();
        assert_eq!(rules.derive(t(10, 30), None), Status::MiniHalfDay);
        assert_eq!(rules.derive(t(11, 30), None), Status::HalfDay);
        assert_eq!(rules.derive(t(9, 0), Some(t(17, 0))), Status::Present);
    }

    #[test]
    fn early_check_out_is_half_day() {
        let rules = StatusRules::default();
        assert_eq!(rules.derive(t(9, 0), Some(t(16, 30))), Status::HalfDay);
        assert_eq!(rules.derive(t(9, 0), Some(t(18, 0))), Status::Present);
    }

    #[test]
    fn late_arrival_wins_over_check_out() {
        let rules = StatusRules::default();
        assert_eq!(rules.derive(t(10, 45), Some(t(19, 0))), Status::MiniHalfDay);
    }

    #[test]
    fn derive_is_stable_for_same_input() {
        let rules = StatusRules::default();
        let first = rules.derive(t(10, 31), Some(t(16, 0)));
        assert_eq!(first, rules.derive(t(10, 31), Some(t(16, 0))));
    }

    #[test]
    fn cutoff_forces_half_day() {
        let rules = StatusRules {
            half_day_from: t(13, 0),
            late_check_in_cutoff: Some(t(12, 0)),
            ..StatusRules::default()
        };
        assert_eq!(rules.derive(t(12, 0), None), Status::HalfDay);
        assert_eq!(rules.derive(t(11, 59), None), Status::MiniHalfDay);
    }

    #[test]
    fn malformed_input_is_rejected() {
        let rules = StatusRules::default();
        assert!(matches!(
            rules.derive_str("quarter past nine", None),
            Err(LedgerError::InvalidTimeFormat(_))
        ));
        assert_eq!(rules.derive_str("09:00:00", Some("16:30:00")).unwrap(), Status::HalfDay);
    }

    #[test]
    fn weekend_days_are_skipped() {
        let policy = WeekendPolicy::default();
        // Friday 2026-01-09 .. Monday 2026-01-12
        let friday = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
        assert_eq!(policy.working_days(friday, monday), vec![friday, monday]);
    }

    #[test]
    fn sunday_only_policy_keeps_saturday() {
        let policy = WeekendPolicy::parse("Sun").unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        assert!(!policy.is_weekend(saturday));
        assert!(WeekendPolicy::parse("Sat,Someday").is_err());
    }
}
