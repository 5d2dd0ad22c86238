pub mod in_flight;
pub mod syncer;

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDay;
use crate::error::{Error, Result};
use crate::streak::StreakRecord;

pub const DEFAULT_PRIMARY_URL: &str = "https://github-contributions-api.jogruber.de/v4";
pub const DEFAULT_FALLBACK_URL: &str = "https://github-contributions-api.deno.dev";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where contribution payloads are fetched from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub primary_base: Url,
    pub fallback_base: Url,
    pub timeout: Duration,
}

impl SourceConfig {
    pub fn new(primary: &str, fallback: &str) -> Result<Self> {
        Ok(Self {
            primary_base: crate::url::parse_base_url(primary)?,
            fallback_base: crate::url::parse_base_url(fallback)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Build from stored `app_config` pairs. Keys that are absent fall back
    /// to the defaults; keys that are present must be valid.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        let primary = get("primary_url").unwrap_or(DEFAULT_PRIMARY_URL);
        let fallback = get("fallback_url").unwrap_or(DEFAULT_FALLBACK_URL);
        let mut config = Self::new(primary, fallback)
            .map_err(|e| Error::Config(format!("bad source URL: {e}")))?;

        if let Some(secs) = get("timeout_secs") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("timeout_secs must be a whole number, got '{secs}'")))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Which endpoint answered a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSource {
    Primary,
    Fallback,
}

/// Result of a sync attempt, or the lack of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    Synced(StreakRecord),
    Error { message: String },
    Pending,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced(_) => "synced",
            SyncStatus::Error { .. } => "error",
            SyncStatus::Pending => "pending",
        }
    }
}

/// A sync status together with the day it was attempted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    #[serde(flatten)]
    pub status: SyncStatus,
    pub attempted_on: CalendarDay,
}

impl SyncOutcome {
    pub fn synced(record: StreakRecord, attempted_on: CalendarDay) -> Self {
        Self {
            status: SyncStatus::Synced(record),
            attempted_on,
        }
    }

    pub fn error(message: impl Into<String>, attempted_on: CalendarDay) -> Self {
        Self {
            status: SyncStatus::Error {
                message: message.into(),
            },
            attempted_on,
        }
    }

    pub fn pending(attempted_on: CalendarDay) -> Self {
        Self {
            status: SyncStatus::Pending,
            attempted_on,
        }
    }

    pub fn record(&self) -> Option<&StreakRecord> {
        match &self.status {
            SyncStatus::Synced(record) => Some(record),
            _ => None,
        }
    }
}

/// Whether a sync should run today given the day of the last attempt.
///
/// At most one attempt per calendar day; a failed attempt also counts.
pub fn sync_due(last_sync_day: Option<CalendarDay>, today: CalendarDay) -> bool {
    last_sync_day != Some(today)
}
