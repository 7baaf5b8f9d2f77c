//! Display helpers for minute amounts and week ranges.

use chrono::NaiveDate;

/// Renders signed minutes as `[-]HH:MM`.
///
/// The value is rounded to the nearest whole minute first.  Hours are
/// padded to two digits but not capped, so large balances render as
/// `123:07`.  Anything that rounds to zero renders as `00:00`.
pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.abs().round() as u64;
    let sign = if minutes < 0.0 && total > 0 { "-" } else { "" };
    format!("{sign}{:02}:{:02}", total / 60, total % 60)
}

/// Short month and day range for a week, e.g. `Feb 24 – Mar 2`.
pub fn format_week_label(week_start: NaiveDate, week_end: NaiveDate) -> String {
    format!("{} – {}", week_start.format("%b %-d"), week_end.format("%b %-d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positive_negative_and_zero() {
        assert_eq!(format_minutes(450.0), "07:30");
        assert_eq!(format_minutes(-75.0), "-01:15");
        assert_eq!(format_minutes(0.0), "00:00");
    }

    #[test]
    fn hours_are_not_capped() {
        assert_eq!(format_minutes((123 * 60 + 7) as f64), "123:07");
        assert_eq!(format_minutes(-6000.0), "-100:00");
    }

    #[test]
    fn rounds_to_nearest_minute() {
        assert_eq!(format_minutes(59.6), "01:00");
        assert_eq!(format_minutes(-0.4), "00:00");
        assert_eq!(format_minutes(-1.5), "-00:02");
    }

    #[test]
    fn week_label_spans_month_boundary() {
        let start = NaiveDate::from_ymd_opt(2025, 2, 24).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert_eq!(format_week_label(start, end), "Feb 24 – Mar 2");
    }
}
