//! Configuration management
//!
//! Settings live in an optional `settings.json` inside the data directory:
//! ```json
//! {
//!   "sourceUrl": "https://brasilapi.com.br/api/banks/v1",
//!   "databaseFile": "banks.duckdb",
//!   "cacheTtlHours": 24,
//!   "requestTimeoutSecs": 30,
//!   "malformedRecords": "fail"
//! }
//! ```
//! Every key is optional. Keys this crate does not manage are preserved when
//! saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::adapters::brasilapi::{DEFAULT_SOURCE_URL, DEFAULT_TIMEOUT_SECS};
use crate::domain::result::{Error, Result};
use crate::services::MalformedPolicy;

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Default bank database file name
pub const DEFAULT_DATABASE_FILE: &str = "banks.duckdb";

/// Upper bound for `cacheTtlHours` (one year)
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 366;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_ttl_hours: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    malformed_records: Option<MalformedPolicy>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub source_url: String,
    pub database_file: String,
    pub cache_ttl_hours: i64,
    pub request_timeout_secs: u64,
    pub malformed_records: MalformedPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            cache_ttl_hours: 24,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            malformed_records: MalformedPolicy::Fail,
        }
    }
}

impl Config {
    /// Load config from the data directory, falling back to defaults
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = Self::read_settings(data_dir)?;
        let defaults = Self::default();

        let config = Self {
            source_url: raw.source_url.unwrap_or(defaults.source_url),
            database_file: raw.database_file.unwrap_or(defaults.database_file),
            cache_ttl_hours: raw.cache_ttl_hours.unwrap_or(defaults.cache_ttl_hours),
            request_timeout_secs: raw
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            malformed_records: raw.malformed_records.unwrap_or(defaults.malformed_records),
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to the data directory, keeping unmanaged keys
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = Self::read_settings(data_dir)?;

        settings.source_url = Some(self.source_url.clone());
        settings.database_file = Some(self.database_file.clone());
        settings.cache_ttl_hours = Some(self.cache_ttl_hours);
        settings.request_timeout_secs = Some(self.request_timeout_secs);
        settings.malformed_records = Some(self.malformed_records);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Names of the settings accepted by `set`
    pub const KEYS: [&'static str; 5] = [
        "sourceUrl",
        "databaseFile",
        "cacheTtlHours",
        "requestTimeoutSecs",
        "malformedRecords",
    ];

    /// Update one setting from its textual form, then re-validate
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "sourceUrl" => updated.source_url = value.to_string(),
            "databaseFile" => updated.database_file = value.to_string(),
            "cacheTtlHours" => updated.cache_ttl_hours = parse_number(key, value)?,
            "requestTimeoutSecs" => updated.request_timeout_secs = parse_number(key, value)?,
            "malformedRecords" => {
                updated.malformed_records =
                    serde_json::from_value(value.into()).map_err(|_| {
                        Error::Config(format!(
                            "malformedRecords must be 'fail' or 'skip', got '{}'",
                            value
                        ))
                    })?
            }
            other => {
                return Err(Error::Config(format!(
                    "Unknown setting '{}' (expected one of: {})",
                    other,
                    Self::KEYS.join(", ")
                )))
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
        let settings_path = data_dir.join(SETTINGS_FILE);
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }

        let content = std::fs::read_to_string(&settings_path)?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid {}: {}", settings_path.display(), e))
        })
    }

    fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(Error::Config("sourceUrl must not be empty".to_string()));
        }
        if self.database_file.trim().is_empty() {
            return Err(Error::Config("databaseFile must not be empty".to_string()));
        }
        if !(0..=MAX_CACHE_TTL_HOURS).contains(&self.cache_ttl_hours) {
            return Err(Error::Config(format!(
                "cacheTtlHours must be between 0 and {}",
                MAX_CACHE_TTL_HOURS
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("requestTimeoutSecs must be positive".to_string()));
        }
        Ok(())
    }

    /// Fetch cache time-to-live
    pub fn cache_ttl(&self) -> Result<Duration> {
        Duration::try_hours(self.cache_ttl_hours).ok_or_else(|| {
            Error::Config(format!("cacheTtlHours out of range: {}", self.cache_ttl_hours))
        })
    }

    pub fn request_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}
