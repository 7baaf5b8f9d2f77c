//! Flexi-time balance engine.
//!
//! The `engine` module turns recorded work, declared days off and
//! redeemed payouts into a [`ComputedResult`].  The computation is pure:
//! it performs no I/O, never mutates its inputs and returns identical
//! output for identical input, so callers may re-run it freely (for
//! instance to preview a payout that has not been saved yet).

use crate::models::{ComputedResult, ComputedWeek, Config, DaysOffMap, PayoutsMap, WeekKey, WorkWeek};
use crate::week::{end_of_week, enumerate_weeks, start_of_week};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Everything one computation depends on, captured by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub weeks: Vec<WorkWeek>,
    #[serde(default)]
    pub days_off: DaysOffMap,
    #[serde(default)]
    pub payouts: PayoutsMap,
    #[serde(default)]
    pub config: Config,
    /// Local calendar date treated as "now".  Falls back to the
    /// configured data end date, then to today.
    #[serde(default)]
    pub now: Option<NaiveDate>,
}

impl Snapshot {
    pub fn compute(&self) -> ComputedResult {
        compute_summary(&self.weeks, &self.days_off, &self.payouts, &self.config, self.now)
    }

    /// The date this snapshot treats as "now".
    pub fn today(&self) -> NaiveDate {
        resolve_now(&self.config, self.now)
    }

    /// The week this snapshot treats as current.
    pub fn current_week(&self) -> WeekKey {
        start_of_week(self.today())
    }
}

/// Resolves the reference date: an explicit `now`, else the configured
/// data end date, else today's local date.
pub fn resolve_now(config: &Config, now: Option<NaiveDate>) -> NaiveDate {
    now.or(config.data_end_date)
        .unwrap_or_else(|| Local::now().date_naive())
}

/// Expected minutes for a week before any payout is applied: the weekly
/// target minus one `hours_per_day` chunk per day off, floored at zero.
pub fn base_expected_minutes(config: &Config, days_off: usize) -> i64 {
    let minutes = (config.target_hours_per_week - days_off as f64 * config.hours_per_day) * 60.0;
    (minutes.round() as i64).max(0)
}

/// Computes the per-week view and the flexi account balance.
///
/// Only weeks from the one containing `config.start_date` through the one
/// containing `now` are considered.  The current week is shown but never
/// accrues into the balance; every payout in `payouts`, including one
/// booked against the current week, is deducted exactly once.
pub fn compute_summary(
    weeks: &[WorkWeek],
    days_off: &DaysOffMap,
    payouts: &PayoutsMap,
    config: &Config,
    now: Option<NaiveDate>,
) -> ComputedResult {
    let now = resolve_now(config, now);
    let current = start_of_week(now);
    let actual_by_week: HashMap<WeekKey, u32> =
        weeks.iter().map(|w| (w.week_start, w.minutes)).collect();

    let computed: Vec<ComputedWeek> = enumerate_weeks(config.start_date, now)
        .map(|week_start| {
            let actual_minutes = actual_by_week.get(&week_start).copied().map_or(0, i64::from);
            let offs: Vec<u8> = days_off
                .get(&week_start)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();
            let payout_minutes = payouts.get(&week_start).copied().map_or(0, i64::from);
            let base_expected = base_expected_minutes(config, offs.len());
            let expected_minutes = base_expected.saturating_sub(payout_minutes).max(0);
            ComputedWeek {
                week_start,
                week_end: end_of_week(week_start),
                actual_minutes,
                expected_minutes,
                diff_minutes: actual_minutes.saturating_sub(expected_minutes),
                days_off: offs,
                is_current_week: week_start == current,
                payout_minutes,
            }
        })
        .collect();

    // A payout shrinks its week's expected minutes and therefore inflates
    // that week's diff; take it back out to get the overtime actually worked.
    let raw_past_balance = computed
        .iter()
        .filter(|week| week.week_start < current)
        .map(|week| week.diff_minutes.saturating_sub(week.payout_minutes))
        .fold(0i64, i64::saturating_add);
    let total_payouts = payouts
        .values()
        .copied()
        .map(i64::from)
        .fold(0i64, i64::saturating_add);
    let plus_account_minutes = raw_past_balance.saturating_sub(total_payouts);

    debug!(
        weeks = computed.len(),
        current_week = %current,
        raw_past_balance,
        total_payouts,
        plus_account_minutes,
        "computed flexi summary"
    );

    let current_week = computed.iter().find(|w| w.is_current_week).cloned();
    let mut weeks = computed;
    weeks.reverse();

    ComputedResult {
        plus_account_minutes,
        current_week,
        weeks,
    }
}
