//! Data models for the Flexi Engine.
//!
//! The `models` module defines the serialisable inputs and outputs of
//! the balance engine: recorded work per calendar week, declared days
//! off, redeemed payouts, the account configuration and the computed
//! per-week view.  All JSON field names are camelCase so the same
//! shapes can be exchanged with a browser client unchanged.

use crate::error::Error;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A calendar week, identified by the local date of its Monday.
///
/// A `WeekKey` is always a Monday.  Its textual form is the zero padded
/// ISO date `YYYY-MM-DD`, so ordering keys by date and ordering their
/// strings lexicographically agree.  Use [`crate::week::start_of_week`]
/// to obtain the key for an arbitrary date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// Wraps a date already known to be a Monday.
    pub(crate) fn from_monday(monday: NaiveDate) -> Self {
        debug_assert_eq!(monday.weekday(), Weekday::Mon);
        WeekKey(monday)
    }

    /// The Monday this key stands for.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for WeekKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| Error::InvalidWeekKey(s.to_string()))?;
        if date.weekday() != Weekday::Mon {
            return Err(Error::NotAMonday(s.to_string()));
        }
        Ok(WeekKey(date))
    }
}

impl TryFrom<String> for WeekKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

/// Total minutes recorded for one calendar week.
///
/// Upstream sources must sum duplicate weeks before handing a batch to
/// the engine; the engine assumes at most one entry per week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkWeek {
    /// The week the minutes were worked in.
    pub week_start: WeekKey,
    /// Total minutes tracked in that week.
    pub minutes: u32,
}

/// Declared non-working weekdays per week (0 = Monday .. 6 = Sunday).
pub type DaysOffMap = BTreeMap<WeekKey, BTreeSet<u8>>;

/// Minutes of banked overtime redeemed against a week's target.
pub type PayoutsMap = BTreeMap<WeekKey, u32>;

/// Account configuration consumed by the engine.
///
/// Only `start_date`, `target_hours_per_week` and `hours_per_day` take
/// part in the arithmetic.  `days_per_week` is descriptive, and
/// `test_mode` / `data_end_date` describe where the data came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// First day of the account.  Need not be a Monday; the week that
    /// contains it is the first week considered.
    pub start_date: NaiveDate,
    /// Hours expected in a week without days off or payouts.
    pub target_hours_per_week: f64,
    /// Hours one declared day off takes off the weekly target.
    pub hours_per_day: f64,
    /// Number of working days in a week.  Informational only.
    #[serde(deserialize_with = "lenient_day_count")]
    pub days_per_week: u8,
    /// Whether the account runs on the built-in sample data.
    #[serde(default)]
    pub test_mode: bool,
    /// Last day covered by the data set.  Used as "now" when the caller
    /// does not pass one, so historical samples stay reproducible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_end_date: Option<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap_or_default(),
            target_hours_per_week: 32.0,
            hours_per_day: 8.0,
            days_per_week: 4,
            test_mode: false,
            data_end_date: None,
        }
    }
}

impl Config {
    /// The user editable part of this configuration.
    pub fn preferences(&self) -> Preferences {
        Preferences {
            target_hours_per_week: self.target_hours_per_week,
            hours_per_day: self.hours_per_day,
            days_per_week: self.days_per_week,
        }
    }

    /// Returns a copy of this configuration with the user's preferences
    /// applied on top.
    pub fn with_preferences(&self, prefs: &Preferences) -> Config {
        Config {
            target_hours_per_week: prefs.target_hours_per_week,
            hours_per_day: prefs.hours_per_day,
            days_per_week: prefs.days_per_week,
            ..self.clone()
        }
    }
}

/// User editable part of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Weekly target in hours, clamped to `1..=120`.
    pub target_hours_per_week: f64,
    /// Length of a working day in hours, clamped to `1..=24`.
    pub hours_per_day: f64,
    /// Working days per week, clamped to `1..=7`.
    #[serde(deserialize_with = "lenient_day_count")]
    pub days_per_week: u8,
}

/// Reads a day count from any JSON number.  Fractions are rounded and the
/// value saturates into `u8`; range checks happen in
/// [`Preferences::clamped`].
fn lenient_day_count<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, f64::from(u8::MAX)) as u8)
}

impl Preferences {
    /// Clamps every field into the range the account form accepts.
    /// Non-finite hours fall back to the lower bound.
    pub fn clamped(self) -> Preferences {
        fn clamp(value: f64, min: f64, max: f64) -> f64 {
            if value.is_finite() {
                value.clamp(min, max)
            } else {
                min
            }
        }
        Preferences {
            target_hours_per_week: clamp(self.target_hours_per_week, 1.0, 120.0),
            hours_per_day: clamp(self.hours_per_day, 1.0, 24.0),
            days_per_week: self.days_per_week.clamp(1, 7),
        }
    }
}

/// The engine's view of one week.  Built fresh on every computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedWeek {
    /// Monday of the week.
    pub week_start: WeekKey,
    /// Sunday of the week.
    pub week_end: NaiveDate,
    /// Minutes recorded, zero when the week has no entry.
    pub actual_minutes: i64,
    /// Target minus days off minus payout, floored at zero.
    pub expected_minutes: i64,
    /// `actual_minutes - expected_minutes`.
    pub diff_minutes: i64,
    /// Declared days off, ascending.
    pub days_off: Vec<u8>,
    /// Whether this week contains "now".  The current week is shown but
    /// does not accrue into the balance.
    pub is_current_week: bool,
    /// Minutes redeemed against this week.
    pub payout_minutes: i64,
}

/// Result of a balance computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedResult {
    /// The flexi account balance: accrued overtime of closed weeks minus
    /// every payout ever redeemed.
    pub plus_account_minutes: i64,
    /// The week containing "now", absent when the account starts later.
    pub current_week: Option<ComputedWeek>,
    /// Newest week first.
    pub weeks: Vec<ComputedWeek>,
}
