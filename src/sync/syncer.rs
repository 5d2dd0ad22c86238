use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::calendar::CalendarDay;
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::streak::compute_streaks;
use crate::sync::{SourceConfig, SyncOutcome, SyncSource};

const USER_AGENT: &str = concat!("streakdw/", env!("CARGO_PKG_VERSION"));

/// Fetches contribution payloads and turns them into streak outcomes.
///
/// Holds no per-identity state; concurrent calls for the same identity are
/// the caller's concern (see [`crate::sync::in_flight::InFlight`]).
#[derive(Debug, Clone)]
pub struct Syncer {
    client: Client,
    config: SourceConfig,
}

impl Syncer {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Sync `identity`, stamping the outcome with today's UTC date.
    pub async fn sync(&self, identity: &str) -> SyncOutcome {
        self.sync_on(identity, CalendarDay::today_utc()).await
    }

    /// Sync `identity`, stamping the outcome with `today`.
    ///
    /// Tries the primary source, then the fallback. Never fails: transport
    /// and decoding problems become an `Error` outcome, and a blank identity
    /// yields `Pending` without touching the network.
    pub async fn sync_on(&self, identity: &str, today: CalendarDay) -> SyncOutcome {
        let identity = identity.trim();
        if identity.is_empty() {
            log::debug!("No identity configured, skipping sync");
            return SyncOutcome::pending(today);
        }

        match self.fetch_payload(identity).await {
            Ok((source, payload)) => {
                let days = normalize(&payload);
                let record = compute_streaks(&days);
                log::info!(
                    "Synced {identity} from {source:?} source: {} active days, current {}, longest {}",
                    days.len(),
                    record.current,
                    record.longest
                );
                SyncOutcome::synced(record, today)
            }
            Err(e) => {
                log::error!("Sync failed for {identity}: {e}");
                SyncOutcome::error(e.to_string(), today)
            }
        }
    }

    /// Fetch the raw payload, falling back to the secondary source once.
    async fn fetch_payload(&self, identity: &str) -> Result<(SyncSource, Value)> {
        let primary_err = match crate::url::primary_endpoint(&self.config.primary_base, identity) {
            Ok(url) => match self.get_json(url).await {
                Ok(payload) => return Ok((SyncSource::Primary, payload)),
                Err(e) => e,
            },
            Err(e) => e,
        };
        log::warn!("Primary source failed for {identity}, trying fallback: {primary_err}");

        let fallback = match crate::url::fallback_endpoint(&self.config.fallback_base, identity) {
            Ok(url) => self.get_json(url).await,
            Err(e) => Err(e),
        };
        match fallback {
            Ok(payload) => Ok((SyncSource::Fallback, payload)),
            Err(fallback_err) => Err(Error::Other(format!(
                "primary source: {primary_err}; fallback source: {fallback_err}"
            ))),
        }
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
