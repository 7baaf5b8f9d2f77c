//! Account data store.
//!
//! Holds the user's declared days off, payouts, preferences and imported
//! time entries.  Data lives in memory and, when a path is configured, is
//! written through to a JSON file on every change.  A change only becomes
//! visible after the file write succeeded, so a failed write leaves the
//! last good state in place.

use crate::entries::TimeEntry;
use crate::error::Result;
use crate::models::{DaysOffMap, PayoutsMap, Preferences, WeekKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Everything persisted for one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    /// Declared days off per week.
    #[serde(default)]
    pub days_off: DaysOffMap,
    /// Redeemed payout minutes per week.
    #[serde(default)]
    pub payouts: PayoutsMap,
    /// Saved preferences, already clamped.  `None` until the user saves
    /// any, in which case the server settings apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    /// Imported raw time entries.
    #[serde(default)]
    pub entries: Vec<TimeEntry>,
}

/// Shared handle on the account data, optionally mirrored to a file.
pub struct Store {
    data: RwLock<AccountData>,
    path: Option<PathBuf>,
}

impl Store {
    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Store {
            data: RwLock::new(AccountData::default()),
            path: None,
        }
    }

    /// Opens the store backed by `path`.  A missing or unreadable file
    /// starts the store empty.  A file that cannot be parsed is first
    /// moved to `<path>.corrupt` so the next write does not destroy it.
    pub async fn open(path: PathBuf) -> Self {
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<AccountData>(&raw) {
                Ok(data) => {
                    info!(path = %path.display(), "loaded account data");
                    data
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to parse account data, starting empty");
                    set_aside(&path).await;
                    AccountData::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no account data yet");
                AccountData::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read account data, starting empty");
                AccountData::default()
            }
        };
        Store {
            data: RwLock::new(data),
            path: Some(path),
        }
    }

    /// A snapshot of the current data.
    pub async fn read(&self) -> AccountData {
        self.data.read().await.clone()
    }

    /// Applies `change` to a copy of the data, persists the copy and only
    /// then makes it current.
    pub async fn update<F>(&self, change: F) -> Result<AccountData>
    where
        F: FnOnce(&mut AccountData),
    {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        change(&mut next);
        self.persist(&next).await?;
        *guard = next.clone();
        Ok(next)
    }

    async fn persist(&self, data: &AccountData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(path, json).await?;
        debug!(path = %path.display(), "persisted account data");
        Ok(())
    }

    pub async fn set_days_off(&self, week: WeekKey, days: BTreeSet<u8>) -> Result<DaysOffMap> {
        let data = self
            .update(|data| {
                data.days_off.insert(week, days);
            })
            .await?;
        Ok(data.days_off)
    }

    pub async fn set_payout(&self, week: WeekKey, minutes: u32) -> Result<PayoutsMap> {
        let data = self
            .update(|data| {
                data.payouts.insert(week, minutes);
            })
            .await?;
        Ok(data.payouts)
    }

    /// Stores `prefs` after clamping them and returns what was stored.
    pub async fn set_preferences(&self, prefs: Preferences) -> Result<Preferences> {
        let prefs = prefs.clamped();
        self.update(|data| data.preferences = Some(prefs)).await?;
        Ok(prefs)
    }

    pub async fn replace_entries(&self, entries: Vec<TimeEntry>) -> Result<usize> {
        let count = entries.len();
        self.update(|data| data.entries = entries).await?;
        Ok(count)
    }
}

/// Renames an unparseable data file to `<name>.corrupt`, replacing an
/// older one.
async fn set_aside(path: &Path) {
    let mut aside = path.as_os_str().to_owned();
    aside.push(".corrupt");
    let aside = PathBuf::from(aside);
    match tokio::fs::rename(path, &aside).await {
        Ok(()) => warn!(path = %aside.display(), "kept unreadable account data"),
        Err(err) => warn!(path = %path.display(), error = %err, "failed to set aside unreadable account data"),
    }
}
