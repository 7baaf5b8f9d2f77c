//! Payout adjustment rules.
//!
//! A payout redeems banked overtime against the current week.  These
//! helpers decide how far a payout may go and how it moves when the user
//! nudges it up or down by the hour.  They only look at the current week;
//! payouts booked against other weeks are never re-validated here.

use crate::engine::base_expected_minutes;
use crate::models::{ComputedResult, ComputedWeek, Config};

const HOUR: i64 = 60;

/// Minutes still to be worked this week if `current_payout` were not
/// redeemed, floored at zero.
///
/// `week.expected_minutes` must come from a computation that already
/// included `current_payout`.
pub fn remaining_target(week: &ComputedWeek, current_payout: i64) -> i64 {
    (week.expected_minutes + current_payout - week.actual_minutes).max(0)
}

/// Largest payout allowed for the current week: no more than the account
/// holds (counting the payout already applied) and no more than what is
/// left of the week's target.
pub fn max_payout(account_minutes: i64, current_payout: i64, remaining_target: i64) -> i64 {
    (account_minutes + current_payout).min(remaining_target)
}

/// [`max_payout`] for a computed result.  Without a current week nothing
/// remains to be redeemed against.
pub fn payout_cap(result: &ComputedResult, current_payout: i64) -> i64 {
    let remaining = result
        .current_week
        .as_ref()
        .map_or(0, |week| remaining_target(week, current_payout));
    max_payout(result.plus_account_minutes, current_payout, remaining)
}

/// Raises `base` to the next full hour (by a whole hour when already on
/// one), never beyond `max`.
pub fn step_up(base: i64, max: i64) -> i64 {
    let remainder = base.rem_euclid(HOUR);
    let to_next_hour = if remainder > 0 { HOUR - remainder } else { HOUR };
    let step = to_next_hour.min(max - base);
    if step > 0 {
        base + step
    } else {
        base
    }
}

/// Lowers `base` to the previous full hour (by a whole hour when already
/// on one), never below zero.
pub fn step_down(base: i64) -> i64 {
    let remainder = base.rem_euclid(HOUR);
    let step = if remainder > 0 { remainder } else { HOUR.min(base) };
    if step > 0 {
        base - step
    } else {
        base
    }
}

/// New payout for the current week after its day-off count changed.
///
/// When the smaller target no longer leaves room for the payout on top of
/// what was already worked, the payout shrinks to whatever room is left.
/// Returns `None` when the stored payout can stay as it is.
pub fn capped_payout_after_day_off_change(
    config: &Config,
    days_off: usize,
    payout: u32,
    actual_minutes: i64,
) -> Option<u32> {
    let payout = i64::from(payout);
    if payout == 0 {
        return None;
    }
    let base = base_expected_minutes(config, days_off);
    if base - payout >= actual_minutes {
        return None;
    }
    let capped = (base - actual_minutes).max(0);
    (capped != payout).then(|| u32::try_from(capped).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_summary;
    use crate::models::{DaysOffMap, PayoutsMap, WorkWeek};
    use chrono::NaiveDate;

    fn config() -> Config {
        Config {
            start_date: NaiveDate::from_ymd_opt(2025, 2, 17).unwrap(),
            ..Config::default()
        }
    }

    #[test]
    fn step_up_moves_to_next_full_hour_within_cap() {
        assert_eq!(step_up(0, 600), 60);
        assert_eq!(step_up(60, 600), 120);
        assert_eq!(step_up(75, 600), 120);
        assert_eq!(step_up(100, 110), 110);
        assert_eq!(step_up(120, 120), 120);
        assert_eq!(step_up(0, -30), 0);
    }

    #[test]
    fn step_down_moves_to_previous_full_hour() {
        assert_eq!(step_down(120), 60);
        assert_eq!(step_down(75), 60);
        assert_eq!(step_down(30), 0);
        assert_eq!(step_down(0), 0);
    }

    #[test]
    fn cap_is_bounded_by_account_and_remaining_target() {
        assert_eq!(max_payout(120, 0, 600), 120);
        assert_eq!(max_payout(900, 0, 600), 600);
        assert_eq!(max_payout(60, 60, 600), 120);
    }

    #[test]
    fn cap_from_computed_result() {
        let weeks = [
            WorkWeek { week_start: "2025-02-17".parse().unwrap(), minutes: 39 * 60 },
            WorkWeek { week_start: "2025-02-24".parse().unwrap(), minutes: 30 * 60 },
        ];
        let now = NaiveDate::from_ymd_opt(2025, 2, 26);
        let result = compute_summary(&weeks, &DaysOffMap::new(), &PayoutsMap::new(), &config(), now);
        // 7h banked, 2h left of this week's target
        assert_eq!(result.plus_account_minutes, 7 * 60);
        assert_eq!(payout_cap(&result, 0), 2 * 60);

        let none = compute_summary(
            &[],
            &DaysOffMap::new(),
            &PayoutsMap::new(),
            &config(),
            NaiveDate::from_ymd_opt(2025, 1, 1),
        );
        assert_eq!(payout_cap(&none, 0), 0);
    }

    #[test]
    fn day_off_shrinks_payout_that_no_longer_fits() {
        // 32h target, one day off leaves 24h; 20h worked leaves room for 4h
        assert_eq!(capped_payout_after_day_off_change(&config(), 1, 6 * 60, 20 * 60), Some(4 * 60));
        // two days off leave 16h, already exceeded
        assert_eq!(capped_payout_after_day_off_change(&config(), 2, 6 * 60, 20 * 60), Some(0));
        // still fits
        assert_eq!(capped_payout_after_day_off_change(&config(), 1, 2 * 60, 20 * 60), None);
        assert_eq!(capped_payout_after_day_off_change(&config(), 4, 0, 20 * 60), None);
    }
}
