//! Week boundary arithmetic.
//!
//! All week math happens on local calendar dates (`NaiveDate`).  An
//! instant is reduced to its calendar date in its own time zone exactly
//! once, in [`local_date`], so a timestamp shortly after local midnight
//! is never attributed to the previous day the way a UTC conversion
//! would.
//!
//! The functions are total over every `NaiveDate` chrono can represent.
//! At the lower end of the calendar a date whose Monday does not exist is
//! assigned to the first representable Monday; at the upper end a week's
//! Sunday saturates at `NaiveDate::MAX` and enumeration simply stops.

use crate::models::WeekKey;
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

/// Index of the weekday with Monday as 0 and Sunday as 6.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// The week containing `date`, i.e. the Monday on or before it.
pub fn start_of_week(date: NaiveDate) -> WeekKey {
    let index = u64::from(weekday_index(date));
    let monday = date
        .checked_sub_days(Days::new(index))
        .or_else(|| date.checked_add_days(Days::new(7 - index)))
        .unwrap_or(date);
    WeekKey::from_monday(monday)
}

/// Sunday of the given week.
pub fn end_of_week(week: WeekKey) -> NaiveDate {
    week.date()
        .checked_add_days(Days::new(6))
        .unwrap_or(NaiveDate::MAX)
}

/// Calendar date of `instant` as seen on a wall clock in its time zone.
pub fn local_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// The week containing `instant`, in the instant's own time zone.
pub fn week_of<Tz: TimeZone>(instant: &DateTime<Tz>) -> WeekKey {
    start_of_week(local_date(instant))
}

/// Every week from the one containing `start` through the one containing
/// `now`, oldest first, one step per seven calendar days.  Empty when
/// `start` falls in a later week than `now`.
pub fn enumerate_weeks(start: NaiveDate, now: NaiveDate) -> impl Iterator<Item = WeekKey> {
    let last = start_of_week(now);
    std::iter::successors(Some(start_of_week(start)), |week| {
        week.date()
            .checked_add_days(Days::new(7))
            .map(WeekKey::from_monday)
    })
    .take_while(move |week| *week <= last)
}
