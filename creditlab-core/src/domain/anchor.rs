//! Week anchor: the weekday on which each resample bucket closes.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resample rule '{0}' (expected W-MON .. W-SUN)")]
pub struct ParseAnchorError(pub String);

/// Weekly bucket rule, written `W-<DAY>` (e.g. `W-FRI`).
///
/// A date belongs to the bucket ending on the first anchor weekday on or
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekAnchor(Weekday);

impl WeekAnchor {
    pub const FRIDAY: WeekAnchor = WeekAnchor(Weekday::Fri);

    pub fn new(weekday: Weekday) -> Self {
        Self(weekday)
    }

    pub fn weekday(&self) -> Weekday {
        self.0
    }

    /// The closing date of the bucket that contains `date`.
    pub fn bucket_end(&self, date: NaiveDate) -> NaiveDate {
        let target = self.0.num_days_from_monday() as i64;
        let current = date.weekday().num_days_from_monday() as i64;
        let ahead = (target - current).rem_euclid(7);
        date + Duration::days(ahead)
    }
}

impl Default for WeekAnchor {
    fn default() -> Self {
        Self::FRIDAY
    }
}

impl fmt::Display for WeekAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = match self.0 {
            Weekday::Mon => "MON",
            Weekday::Tue => "TUE",
            Weekday::Wed => "WED",
            Weekday::Thu => "THU",
            Weekday::Fri => "FRI",
            Weekday::Sat => "SAT",
            Weekday::Sun => "SUN",
        };
        write!(f, "W-{day}")
    }
}

impl FromStr for WeekAnchor {
    type Err = ParseAnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let day = upper
            .strip_prefix("W-")
            .ok_or_else(|| ParseAnchorError(s.to_string()))?;
        let weekday = match day {
            "MON" => Weekday::Mon,
            "TUE" => Weekday::Tue,
            "WED" => Weekday::Wed,
            "THU" => Weekday::Thu,
            "FRI" => Weekday::Fri,
            "SAT" => Weekday::Sat,
            "SUN" => Weekday::Sun,
            _ => return Err(ParseAnchorError(s.to_string())),
        };
        Ok(Self(weekday))
    }
}

impl TryFrom<String> for WeekAnchor {
    type Error = ParseAnchorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekAnchor> for String {
    fn from(anchor: WeekAnchor) -> Self {
        anchor.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn friday_bucket_end() {
        let anchor = WeekAnchor::FRIDAY;
        // Mon 2024-01-01 .. Fri 2024-01-05 share a bucket
        assert_eq!(anchor.bucket_end(d(2024, 1, 1)), d(2024, 1, 5));
        assert_eq!(anchor.bucket_end(d(2024, 1, 5)), d(2024, 1, 5));
        // Saturday rolls into the next week
        assert_eq!(anchor.bucket_end(d(2024, 1, 6)), d(2024, 1, 12));
    }

    #[test]
    fn monday_bucket_end() {
        let anchor: WeekAnchor = "W-MON".parse().unwrap();
        assert_eq!(anchor.bucket_end(d(2024, 1, 2)), d(2024, 1, 8));
        assert_eq!(anchor.bucket_end(d(2024, 1, 8)), d(2024, 1, 8));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("w-fri".parse::<WeekAnchor>().unwrap(), WeekAnchor::FRIDAY);
    }

    #[test]
    fn rejects_unknown_rule() {
        assert!("M".parse::<WeekAnchor>().is_err());
        assert!("W-XYZ".parse::<WeekAnchor>().is_err());
    }

    #[test]
    fn display_roundtrips() {
        for rule in ["W-MON", "W-TUE", "W-WED", "W-THU", "W-FRI", "W-SAT", "W-SUN"] {
            let anchor: WeekAnchor = rule.parse().unwrap();
            assert_eq!(anchor.to_string(), rule);
        }
    }

    #[test]
    fn serde_uses_rule_string() {
        let json = serde_json::to_string(&WeekAnchor::FRIDAY).unwrap();
        assert_eq!(json, "\"W-FRI\"");
        let back: WeekAnchor = serde_json::from_str("\"W-WED\"").unwrap();
        assert_eq!(back.weekday(), Weekday::Wed);
        assert!(serde_json::from_str::<WeekAnchor>("\"daily\"").is_err());
    }
}
