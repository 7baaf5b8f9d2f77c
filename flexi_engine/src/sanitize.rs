//! Input sanitisation for values that arrive from clients or stores
//! before they are placed into a [`DaysOffMap`](crate::models::DaysOffMap)
//! or [`PayoutsMap`](crate::models::PayoutsMap).

use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Keeps weekday indices in `0..7` and drops duplicates.
pub fn sanitize_day_indices(raw: &[i64]) -> BTreeSet<u8> {
    raw.iter()
        .filter_map(|&day| u8::try_from(day).ok())
        .filter(|&day| day < 7)
        .collect()
}

/// Accepts a payout amount only when it is a non-negative number of
/// minutes that fits the store.
pub fn sanitize_payout_minutes(raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| Error::InvalidPayout(raw))
}
