//! Process settings read from the environment.
//!
//! Values come from real environment variables, optionally seeded from a
//! `.env` file.  Anything unset falls back to a default; anything set but
//! malformed is an error rather than being silently ignored.

use crate::entries::{sample_bounds, sample_entries};
use crate::error::{Error, Result};
use crate::models::Config;
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:43001";
pub const DEFAULT_START_DATE: &str = "2026-01-01";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_addr: String,
    /// JSON file mirroring the store.  In-memory only when unset.
    pub data_file: Option<PathBuf>,
    pub config: Config,
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("FLEXI_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let data_file = lookup("FLEXI_DATA_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let test_mode = lookup("TEST_MODE").is_some_and(|v| v == "true");

        let start_date = match lookup("START_DATE") {
            Some(raw) => parse_date("START_DATE", &raw)?,
            None => parse_date("START_DATE", DEFAULT_START_DATE)?,
        };
        let mut config = Config {
            start_date,
            target_hours_per_week: parse_or("TARGET_HOURS_PER_WEEK", &lookup, 32.0)?,
            hours_per_day: parse_or("HOURS_PER_DAY", &lookup, 8.0)?,
            days_per_week: parse_or("DAYS_PER_WEEK", &lookup, 4)?,
            test_mode,
            data_end_date: None,
        };
        if test_mode {
            if let Some((first, last)) = sample_bounds(&sample_entries(), &Utc) {
                config.start_date = first;
                config.data_end_date = Some(last);
            }
        }

        Ok(Settings {
            bind_addr,
            data_file,
            config,
        })
    }
}

fn parse_date(name: &'static str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| Error::Setting {
        name,
        reason: format!("{raw:?}: {err}"),
    })
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| Error::Setting {
            name,
            reason: format!("{raw:?}: {err}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(settings.data_file, None);
        assert_eq!(settings.config.start_date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(settings.config.target_hours_per_week, 32.0);
        assert_eq!(settings.config.hours_per_day, 8.0);
        assert_eq!(settings.config.days_per_week, 4);
        assert!(!settings.config.test_mode);
    }

    #[test]
    fn values_are_read_from_environment() {
        let settings = Settings::from_lookup(lookup(&[
            ("START_DATE", "2025-01-06"),
            ("TARGET_HOURS_PER_WEEK", "38.5"),
            ("DAYS_PER_WEEK", "5"),
            ("FLEXI_DATA_FILE", "/tmp/flexi.json"),
        ]))
        .unwrap();
        assert_eq!(settings.config.start_date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(settings.config.target_hours_per_week, 38.5);
        assert_eq!(settings.config.days_per_week, 5);
        assert_eq!(settings.data_file, Some(PathBuf::from("/tmp/flexi.json")));
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = Settings::from_lookup(lookup(&[("HOURS_PER_DAY", "eight")])).unwrap_err();
        assert!(matches!(err, Error::Setting { name: "HOURS_PER_DAY", .. }));
        let err = Settings::from_lookup(lookup(&[("START_DATE", "01.01.2026")])).unwrap_err();
        assert!(matches!(err, Error::Setting { name: "START_DATE", .. }));
    }

    #[test]
    fn test_mode_uses_sample_bounds() {
        let settings = Settings::from_lookup(lookup(&[("TEST_MODE", "true")])).unwrap();
        assert!(settings.config.test_mode);
        assert_eq!(settings.config.start_date, NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
        assert_eq!(settings.config.data_end_date, NaiveDate::from_ymd_opt(2026, 2, 5));
    }
}
