//! Raw time entries and their aggregation into calendar weeks.
//!
//! Time-tracking services report work as start/stop intervals.  The
//! balance engine only wants one minute total per week, so entries are
//! summed here by the local week their start falls into.

use crate::models::{WeekKey, WorkWeek};
use crate::week::{local_date, week_of};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One tracked interval as reported by the time-tracking service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub start: DateTime<FixedOffset>,
    #[serde(default)]
    pub stop: Option<DateTime<FixedOffset>>,
    /// Duration in seconds.  Negative while the entry is still running.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TimeEntry {
    /// Whole minutes covered by this entry.  An explicit duration wins over
    /// the stop time; an entry without either counts as zero.
    pub fn minutes(&self) -> u32 {
        let seconds = self
            .duration
            .or_else(|| self.stop.map(|stop| (stop - self.start).num_seconds()))
            .unwrap_or(0);
        let minutes = (seconds as f64 / 60.0).round();
        minutes.clamp(0.0, f64::from(u32::MAX)) as u32
    }
}

/// Sums entry minutes per week, using the calendar of `tz` to decide which
/// week an entry starts in.  The result holds one entry per week, oldest
/// first.
pub fn aggregate_by_week<Tz: TimeZone>(entries: &[TimeEntry], tz: &Tz) -> Vec<WorkWeek> {
    let mut weeks: BTreeMap<WeekKey, u32> = BTreeMap::new();
    for entry in entries {
        let week = week_of(&entry.start.with_timezone(tz));
        let total = weeks.entry(week).or_default();
        *total = total.saturating_add(entry.minutes());
    }
    weeks
        .into_iter()
        .map(|(week_start, minutes)| WorkWeek { week_start, minutes })
        .collect()
}

/// First and last calendar day touched by `entries` in the calendar of `tz`.
pub fn sample_bounds<Tz: TimeZone>(entries: &[TimeEntry], tz: &Tz) -> Option<(NaiveDate, NaiveDate)> {
    let dates = entries
        .iter()
        .flat_map(|entry| std::iter::once(entry.start).chain(entry.stop))
        .map(|instant| local_date(&instant.with_timezone(tz)));
    let (mut first, mut last): (Option<NaiveDate>, Option<NaiveDate>) = (None, None);
    for date in dates {
        first = Some(first.map_or(date, |d| d.min(date)));
        last = Some(last.map_or(date, |d| d.max(date)));
    }
    first.zip(last)
}

// (year, month, day, start hour, start minute, stop hour, stop minute), UTC
const SAMPLE: &[(i32, u32, u32, u32, u32, u32, u32)] = &[
    (2025, 12, 29, 8, 0, 16, 0),
    (2025, 12, 30, 8, 0, 16, 0),
    (2025, 12, 31, 8, 0, 16, 0),
    (2026, 1, 2, 8, 0, 16, 0),
    (2026, 1, 5, 8, 0, 16, 30),
    (2026, 1, 6, 8, 0, 16, 30),
    (2026, 1, 7, 8, 0, 16, 30),
    (2026, 1, 8, 8, 0, 16, 30),
    (2026, 1, 12, 8, 0, 17, 0),
    (2026, 1, 13, 8, 0, 17, 0),
    (2026, 1, 14, 8, 0, 17, 0),
    (2026, 1, 15, 8, 0, 17, 0),
    (2026, 1, 19, 8, 0, 16, 0),
    (2026, 1, 20, 8, 30, 16, 0),
    (2026, 1, 21, 8, 0, 16, 0),
    (2026, 1, 22, 8, 0, 13, 0),
    (2026, 1, 26, 8, 0, 16, 0),
    (2026, 1, 27, 8, 0, 16, 0),
    (2026, 1, 28, 8, 0, 15, 0),
    (2026, 1, 29, 8, 30, 22, 30),
    (2026, 2, 2, 8, 0, 17, 0),
    (2026, 2, 3, 8, 0, 17, 0),
    (2026, 2, 4, 8, 0, 17, 0),
    (2026, 2, 5, 8, 0, 10, 30),
];

/// Fixed data set served in test mode: six weeks around the turn of 2026.
pub fn sample_entries() -> Vec<TimeEntry> {
    let at = |y: i32, mo: u32, d: u32, h: u32, mi: u32| {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .map(|t| t.fixed_offset())
    };
    SAMPLE
        .iter()
        .filter_map(|&(y, mo, d, sh, sm, eh, em)| {
            Some(TimeEntry {
                id: None,
                start: at(y, mo, d, sh, sm)?,
                stop: Some(at(y, mo, d, eh, em)?),
                duration: None,
                description: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Berlin;

    fn entry(start: &str, stop: Option<&str>, duration: Option<i64>) -> TimeEntry {
        TimeEntry {
            id: None,
            start: DateTime::parse_from_rfc3339(start).unwrap(),
            stop: stop.map(|s| DateTime::parse_from_rfc3339(s).unwrap()),
            duration,
            description: None,
        }
    }

    #[test]
    fn minutes_prefer_duration_then_stop() {
        assert_eq!(entry("2026-01-05T08:00:00Z", Some("2026-01-05T16:30:00Z"), None).minutes(), 510);
        assert_eq!(entry("2026-01-05T08:00:00Z", Some("2026-01-05T16:30:00Z"), Some(3600)).minutes(), 60);
        assert_eq!(entry("2026-01-05T08:00:00Z", None, None).minutes(), 0);
        assert_eq!(entry("2026-01-05T08:00:00Z", None, Some(-1_767_600_000)).minutes(), 0);
        assert_eq!(entry("2026-01-05T08:00:00Z", None, Some(89)).minutes(), 1);
    }

    #[test]
    fn aggregates_per_local_week() {
        let entries = [
            entry("2026-01-05T08:00:00Z", Some("2026-01-05T12:00:00Z"), None),
            entry("2026-01-07T08:00:00Z", Some("2026-01-07T10:00:00Z"), None),
            // Monday 00:30 in Berlin, still Sunday in UTC
            entry("2026-01-11T23:30:00Z", Some("2026-01-12T01:30:00Z"), None),
        ];
        let berlin = aggregate_by_week(&entries, &Berlin);
        assert_eq!(
            berlin,
            vec![
                WorkWeek { week_start: "2026-01-05".parse().unwrap(), minutes: 360 },
                WorkWeek { week_start: "2026-01-12".parse().unwrap(), minutes: 120 },
            ]
        );
        let utc = aggregate_by_week(&entries, &Utc);
        assert_eq!(utc, vec![WorkWeek { week_start: "2026-01-05".parse().unwrap(), minutes: 480 }]);
    }

    #[test]
    fn sample_data_covers_six_weeks() {
        let entries = sample_entries();
        assert_eq!(entries.len(), SAMPLE.len());
        let weeks = aggregate_by_week(&entries, &Utc);
        let totals: Vec<u32> = weeks.iter().map(|w| w.minutes).collect();
        assert_eq!(totals, vec![1920, 2040, 2160, 1710, 2220, 1770]);
        assert_eq!(weeks[0].week_start.to_string(), "2025-12-29");

        let (first, last) = sample_bounds(&entries, &Utc).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 2, 5).unwrap());
    }

    #[test]
    fn bounds_of_nothing_is_none() {
        assert_eq!(sample_bounds(&[], &Utc), None);
    }
}
