//! Optimistic editing on top of the balance engine.
//!
//! An [`AccountSession`] holds the last snapshot confirmed by the store
//! and, while a write is in flight, a tentative copy with the user's edit
//! already applied.  The tentative copy drives the display until the
//! store answers: success replaces the confirmed snapshot with the one the
//! store returned, failure throws the tentative copy away.  The two are
//! never merged.
//!
//! A payout draft is kept apart from both snapshots.  It is only folded
//! into the computation as the current week's payout, which turns the
//! ordinary engine call into a live preview of the balance.

use crate::engine::{compute_summary, Snapshot};
use crate::models::{ComputedResult, WeekKey};
use crate::payout::{capped_payout_after_day_off_change, payout_cap, step_down, step_up};
use tracing::{debug, warn};

/// A change the persistence layer has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Declare `day` (0 = Monday) off in `week`, or revoke it.
    ToggleDayOff { week: WeekKey, day: u8 },
    /// Store `minutes` as the payout for `week`.
    SetPayout { week: WeekKey, minutes: u32 },
}

impl Edit {
    fn apply(&self, snapshot: &mut Snapshot) {
        match *self {
            Edit::ToggleDayOff { week, day } => {
                if day >= 7 {
                    debug!(%week, day, "ignoring out of range day index");
                    return;
                }
                let days = snapshot.days_off.entry(week).or_default();
                if !days.remove(&day) {
                    days.insert(day);
                }
            }
            Edit::SetPayout { week, minutes } => {
                snapshot.payouts.insert(week, minutes);
            }
        }
    }
}

/// Outcome of staging an edit: what to show right away and what to send
/// to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    pub preview: ComputedResult,
    pub edits: Vec<Edit>,
}

#[derive(Debug, Clone)]
pub struct AccountSession {
    confirmed: Snapshot,
    tentative: Option<Snapshot>,
    draft: Option<u32>,
}

impl AccountSession {
    pub fn new(confirmed: Snapshot) -> Self {
        AccountSession {
            confirmed,
            tentative: None,
            draft: None,
        }
    }

    /// The snapshot last confirmed by the store.
    pub fn confirmed(&self) -> &Snapshot {
        &self.confirmed
    }

    /// The snapshot currently on display: tentative if a write is in flight.
    pub fn snapshot(&self) -> &Snapshot {
        self.tentative.as_ref().unwrap_or(&self.confirmed)
    }

    pub fn has_pending_write(&self) -> bool {
        self.tentative.is_some()
    }

    pub fn payout_draft(&self) -> Option<u32> {
        self.draft
    }

    /// Balance and weeks for the displayed snapshot, with an open payout
    /// draft standing in for the current week's stored payout.
    pub fn summary(&self) -> ComputedResult {
        let snapshot = self.snapshot();
        match self.draft {
            Some(pending) => {
                let mut payouts = snapshot.payouts.clone();
                payouts.insert(snapshot.current_week(), pending);
                compute_summary(
                    &snapshot.weeks,
                    &snapshot.days_off,
                    &payouts,
                    &snapshot.config,
                    snapshot.now,
                )
            }
            None => snapshot.compute(),
        }
    }

    /// Payout stored for the current week in the displayed snapshot.
    pub fn persisted_payout(&self) -> u32 {
        let snapshot = self.snapshot();
        snapshot
            .payouts
            .get(&snapshot.current_week())
            .copied()
            .unwrap_or(0)
    }

    /// The payout in effect for the current week: the draft if one is
    /// open, else the stored value.
    pub fn current_payout(&self) -> u32 {
        self.draft.unwrap_or_else(|| self.persisted_payout())
    }

    /// Largest payout the current week accepts right now.
    pub fn max_payout(&self) -> i64 {
        payout_cap(&self.summary(), i64::from(self.current_payout()))
    }

    /// Opens a payout draft starting from the stored value.  Returns the
    /// draft, which is left alone if one is already open.
    pub fn open_payout(&mut self) -> u32 {
        if let Some(pending) = self.draft {
            return pending;
        }
        let persisted = self.persisted_payout();
        self.draft = Some(persisted);
        persisted
    }

    pub fn payout_step_up(&mut self) -> u32 {
        let max = self.max_payout();
        let base = self.open_payout();
        let next = step_up(i64::from(base), max);
        self.set_draft(next)
    }

    pub fn payout_step_down(&mut self) -> u32 {
        let base = self.open_payout();
        let next = step_down(i64::from(base));
        self.set_draft(next)
    }

    fn set_draft(&mut self, minutes: i64) -> u32 {
        let minutes = u32::try_from(minutes.max(0)).unwrap_or(u32::MAX);
        self.draft = Some(minutes);
        minutes
    }

    /// Drops the draft; the stored payout is shown again.
    pub fn cancel_payout(&mut self) {
        self.draft = None;
    }

    /// Whether the open draft differs from the stored payout.
    pub fn payout_draft_changed(&self) -> bool {
        self.draft
            .is_some_and(|pending| pending != self.persisted_payout())
    }

    /// Stages the open draft as the current week's payout.  Returns `None`
    /// when there is nothing to save.  A draft of zero is closed once
    /// staged; any other draft stays open for further adjustment.
    pub fn confirm_payout(&mut self) -> Option<StagedChange> {
        if !self.payout_draft_changed() {
            return None;
        }
        let minutes = self.draft?;
        let week = self.snapshot().current_week();
        let staged = self.stage(Edit::SetPayout { week, minutes });
        if minutes == 0 {
            self.draft = None;
        }
        Some(staged)
    }

    /// Applies `edit` tentatively and returns the preview together with
    /// every edit the store has to persist.
    ///
    /// Toggling a day off in the current week closes an open payout draft
    /// and, when the smaller target no longer leaves room for the stored
    /// payout, adds a payout correction.
    pub fn stage(&mut self, edit: Edit) -> StagedChange {
        let mut next = self.snapshot().clone();
        let mut edits = vec![edit];
        edit.apply(&mut next);

        if let Edit::ToggleDayOff { week, .. } = edit {
            if week == next.current_week() {
                self.draft = None;
                let days_off = next.days_off.get(&week).map_or(0, |days| days.len());
                let payout = next.payouts.get(&week).copied().unwrap_or(0);
                let actual = next
                    .weeks
                    .iter()
                    .find(|w| w.week_start == week)
                    .map_or(0, |w| i64::from(w.minutes));
                if let Some(minutes) =
                    capped_payout_after_day_off_change(&next.config, days_off, payout, actual)
                {
                    debug!(%week, from = payout, to = minutes, "capping payout after day off change");
                    let correction = Edit::SetPayout { week, minutes };
                    correction.apply(&mut next);
                    edits.push(correction);
                }
            }
        }

        self.tentative = Some(next);
        StagedChange {
            preview: self.summary(),
            edits,
        }
    }

    /// Settles an in-flight write.
    ///
    /// On success the store's snapshot becomes the confirmed one.  On
    /// failure the tentative snapshot is discarded and the error handed
    /// back; the display falls back to the last confirmed state.
    pub fn reconcile<E: std::fmt::Display>(
        &mut self,
        outcome: Result<Snapshot, E>,
    ) -> Result<ComputedResult, E> {
        self.tentative = None;
        match outcome {
            Ok(authoritative) => {
                self.confirmed = authoritative;
                Ok(self.summary())
            }
            Err(err) => {
                warn!(error = %err, "write failed, rolling back to confirmed snapshot");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Config, WorkWeek};
    use chrono::NaiveDate;

    const H: u32 = 60;

    fn key(s: &str) -> WeekKey {
        s.parse().unwrap()
    }

    /// 7h banked in the week of Feb 17, 20h worked so far in the current week.
    fn snapshot() -> Snapshot {
        Snapshot {
            weeks: vec![
                WorkWeek { week_start: key("2025-02-17"), minutes: 39 * H },
                WorkWeek { week_start: key("2025-02-24"), minutes: 20 * H },
            ],
            config: Config {
                start_date: NaiveDate::from_ymd_opt(2025, 2, 17).unwrap(),
                ..Config::default()
            },
            now: NaiveDate::from_ymd_opt(2025, 2, 26),
            ..Snapshot::default()
        }
    }

    #[test]
    fn draft_previews_balance_without_touching_snapshot() {
        let mut session = AccountSession::new(snapshot());
        assert_eq!(session.summary().plus_account_minutes, (7 * H) as i64);

        assert_eq!(session.open_payout(), 0);
        assert_eq!(session.payout_step_up(), H);
        assert_eq!(session.payout_step_up(), 2 * H);
        assert_eq!(session.summary().plus_account_minutes, (5 * H) as i64);
        assert!(session.confirmed().payouts.is_empty());
        assert!(session.payout_draft_changed());

        session.cancel_payout();
        assert_eq!(session.summary().plus_account_minutes, (7 * H) as i64);
    }

    #[test]
    fn step_up_stops_at_account_balance() {
        let mut session = AccountSession::new(snapshot());
        for _ in 0..10 {
            session.payout_step_up();
        }
        // 12h left this week but only 7h banked
        assert_eq!(session.payout_draft(), Some(7 * H));
        assert_eq!(session.summary().plus_account_minutes, 0);
        assert_eq!(session.payout_step_down(), 6 * H);
    }

    #[test]
    fn confirmed_payout_is_staged_then_reconciled() {
        let mut session = AccountSession::new(snapshot());
        session.payout_step_up();
        let staged = session.confirm_payout().unwrap();
        assert_eq!(staged.edits, vec![Edit::SetPayout { week: key("2025-02-24"), minutes: H }]);
        assert_eq!(staged.preview.plus_account_minutes, (6 * H) as i64);
        assert!(session.has_pending_write());

        let mut authoritative = snapshot();
        authoritative.payouts.insert(key("2025-02-24"), H);
        let result = session.reconcile::<String>(Ok(authoritative)).unwrap();
        assert_eq!(result.plus_account_minutes, (6 * H) as i64);
        assert!(!session.has_pending_write());
        assert!(!session.payout_draft_changed());
        assert!(session.confirm_payout().is_none());
    }

    #[test]
    fn failed_write_rolls_back() {
        let mut session = AccountSession::new(snapshot());
        let staged = session.stage(Edit::ToggleDayOff { week: key("2025-02-17"), day: 0 });
        // one day off in the closed week turns 7h into 15h
        assert_eq!(staged.preview.plus_account_minutes, (15 * H) as i64);

        let err = session.reconcile(Err("store unavailable")).unwrap_err();
        assert_eq!(err, "store unavailable");
        assert_eq!(session.summary().plus_account_minutes, (7 * H) as i64);
        assert!(session.snapshot().days_off.is_empty());
    }

    #[test]
    fn authoritative_snapshot_wins_over_tentative() {
        let mut session = AccountSession::new(snapshot());
        session.stage(Edit::ToggleDayOff { week: key("2025-02-17"), day: 0 });
        let result = session.reconcile::<String>(Ok(snapshot())).unwrap();
        assert_eq!(result.plus_account_minutes, (7 * H) as i64);
    }

    #[test]
    fn toggling_twice_restores_the_week() {
        let mut session = AccountSession::new(snapshot());
        session.stage(Edit::ToggleDayOff { week: key("2025-02-17"), day: 2 });
        let staged = session.stage(Edit::ToggleDayOff { week: key("2025-02-17"), day: 2 });
        assert_eq!(staged.preview.plus_account_minutes, (7 * H) as i64);
    }

    #[test]
    fn current_week_day_off_closes_draft_and_caps_payout() {
        let mut base = snapshot();
        base.payouts.insert(key("2025-02-24"), 6 * H);
        let mut session = AccountSession::new(base);
        session.open_payout();

        // 32h - 8h = 24h target, 20h worked: only 4h of payout still fit
        let staged = session.stage(Edit::ToggleDayOff { week: key("2025-02-24"), day: 4 });
        assert_eq!(session.payout_draft(), None);
        assert_eq!(
            staged.edits,
            vec![
                Edit::ToggleDayOff { week: key("2025-02-24"), day: 4 },
                Edit::SetPayout { week: key("2025-02-24"), minutes: 4 * H },
            ]
        );
        assert_eq!(staged.preview.plus_account_minutes, (3 * H) as i64);
        assert_eq!(staged.preview.current_week.unwrap().expected_minutes, (20 * H) as i64);
    }

    #[test]
    fn out_of_range_day_is_ignored() {
        let mut session = AccountSession::new(snapshot());
        let staged = session.stage(Edit::ToggleDayOff { week: key("2025-02-17"), day: 9 });
        assert_eq!(staged.preview.plus_account_minutes, (7 * H) as i64);
    }
}
