pub mod calendar;
pub mod date_util;
pub mod error;
pub mod normalize;
pub mod storage;
pub mod streak;
pub mod sync;
pub mod url;

pub use calendar::{ActiveDateSet, CalendarDay};
pub use error::{Error, Result};
pub use normalize::{normalize, PayloadShape};
pub use storage::repository::SyncState;
pub use storage::Database;
pub use streak::{compute_streaks, StreakRecord};
pub use sync::in_flight::InFlight;
pub use sync::syncer::Syncer;
pub use sync::{sync_due, SourceConfig, SyncOutcome, SyncSource, SyncStatus};

use storage::repository;

/// Main entry point: the sync engine plus the state store it reports into.
pub struct StreakDW {
    db: Database,
    syncer: Syncer,
    in_flight: InFlight,
}

impl StreakDW {
    pub fn new(db: Database, syncer: Syncer) -> Self {
        Self {
            db,
            syncer,
            in_flight: InFlight::new(),
        }
    }

    /// Build the syncer from the source settings stored in `app_config`.
    pub async fn from_config(db: Database) -> Result<Self> {
        let pairs = db.reader().call(|conn| repository::list_config(conn)).await?;
        let syncer = Syncer::new(SourceConfig::from_pairs(&pairs)?)?;
        Ok(Self::new(db, syncer))
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Resolve the identity to track: the explicit argument if given,
    /// otherwise the `identity` config key.
    pub async fn identity(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(input) = explicit {
            return url::resolve_identity(input);
        }
        let stored: Option<String> = self
            .db
            .reader()
            .call(|conn| repository::get_config(conn, "identity"))
            .await?;
        match stored {
            Some(input) => url::resolve_identity(&input),
            None => Err(Error::Config(
                "no identity configured. Run: streakdw config set identity <USERNAME>".into(),
            )),
        }
    }

    /// Stored state for an identity, if it was ever synced.
    pub async fn state(&self, identity: &str) -> Result<Option<SyncState>> {
        self.db
            .reader()
            .call({
                let identity = identity.to_string();
                move |conn| repository::load_state(conn, &identity)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Last stored outcome for an identity, or `Pending` dated `today` if it
    /// was never attempted.
    pub async fn outcome_on(&self, identity: &str, today: CalendarDay) -> Result<SyncOutcome> {
        let identity = identity.to_string();
        let outcome = self
            .db
            .reader()
            .call(move |conn| repository::load_outcome(conn, &identity, today))
            .await?;
        Ok(outcome)
    }

    /// Sync an identity for today (UTC).
    pub async fn sync(&self, identity: &str, force: bool) -> Result<SyncOutcome> {
        self.sync_on(identity, CalendarDay::today_utc(), force).await
    }

    /// Sync an identity at most once per calendar day and persist the outcome.
    ///
    /// A sync already running for the same identity yields `Pending`.
    /// Otherwise, unless `force` is set, an identity already attempted on
    /// `today` is not fetched again and its stored outcome is returned. The
    /// stored state is read while holding the in-flight guard.
    pub async fn sync_on(
        &self,
        identity: &str,
        today: CalendarDay,
        force: bool,
    ) -> Result<SyncOutcome> {
        let Some(_guard) = self.in_flight.try_acquire(identity) else {
            return Ok(SyncOutcome::pending(today));
        };

        let stored = self.state(identity).await?;
        let last_sync_day = stored.as_ref().map(|s| s.last.attempted_on);
        if !force && !sync_due(last_sync_day, today) {
            log::info!("{identity} already synced on {today}, skipping");
            if let Some(state) = stored {
                return Ok(state.last);
            }
        }

        let outcome = self.syncer.sync_on(identity, today).await;
        self.db
            .writer()
            .call({
                let identity = identity.to_string();
                let outcome = outcome.clone();
                move |conn| repository::save_outcome(conn, &identity, &outcome)
            })
            .await?;
        Ok(outcome)
    }
}
