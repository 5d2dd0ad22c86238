use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::calendar::CalendarDay;
use crate::streak::StreakRecord;
use crate::sync::{SyncOutcome, SyncStatus};

impl ToSql for CalendarDay {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for CalendarDay {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// ── Sync state ─────────────────────────────────────────────────────

/// Persisted sync state for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub identity: String,
    /// The most recent attempt, successful or not.
    pub last: SyncOutcome,
    /// Numbers from the most recent successful sync.
    pub streak: StreakRecord,
}

/// Store a sync outcome.
///
/// A synced outcome replaces the stored streak wholesale. An error outcome
/// records the attempt and message but keeps the previous streak numbers.
/// A pending outcome is not an attempt and is not stored; returns whether a
/// row was written.
pub fn save_outcome(
    conn: &Connection,
    identity: &str,
    outcome: &SyncOutcome,
) -> Result<bool, rusqlite::Error> {
    match &outcome.status {
        SyncStatus::Synced(record) => {
            conn.execute(
                "INSERT INTO sync_state
                   (identity, attempted_on, status, current_streak, longest_streak,
                    last_active_date, error, updated_at)
                 VALUES (?1, ?2, 'synced', ?3, ?4, ?5, NULL, datetime('now'))
                 ON CONFLICT(identity) DO UPDATE SET
                   attempted_on = excluded.attempted_on,
                   status = excluded.status,
                   current_streak = excluded.current_streak,
                   longest_streak = excluded.longest_streak,
                   last_active_date = excluded.last_active_date,
                   error = NULL,
                   updated_at = excluded.updated_at",
                params![
                    identity,
                    outcome.attempted_on,
                    record.current,
                    record.longest,
                    record.last_active_date
                ],
            )?;
        }
        SyncStatus::Error { message } => {
            conn.execute(
                "INSERT INTO sync_state (identity, attempted_on, status, error, updated_at)
                 VALUES (?1, ?2, 'error', ?3, datetime('now'))
                 ON CONFLICT(identity) DO UPDATE SET
                   attempted_on = excluded.attempted_on,
                   status = excluded.status,
                   error = excluded.error,
                   updated_at = excluded.updated_at",
                params![identity, outcome.attempted_on, message],
            )?;
        }
        SyncStatus::Pending => return Ok(false),
    }
    Ok(true)
}

/// Load the stored state for an identity (case-insensitive).
pub fn load_state(conn: &Connection, identity: &str) -> Result<Option<SyncState>, rusqlite::Error> {
    conn.query_row(
        "SELECT identity, attempted_on, status, current_streak, longest_streak,
                last_active_date, error
         FROM sync_state WHERE identity = ?1",
        params![identity],
        |row| {
            let streak = StreakRecord {
                current: row.get(3)?,
                longest: row.get(4)?,
                last_active_date: row.get(5)?,
            };
            let status: String = row.get(2)?;
            let status = if status == "synced" {
                SyncStatus::Synced(streak)
            } else {
                SyncStatus::Error {
                    message: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                }
            };
            Ok(SyncState {
                identity: row.get(0)?,
                last: SyncOutcome {
                    status,
                    attempted_on: row.get(1)?,
                },
                streak,
            })
        },
    )
    .optional()
}

/// Load the last stored outcome for an identity. An identity that was never
/// attempted loads as `Pending` dated `today`.
pub fn load_outcome(
    conn: &Connection,
    identity: &str,
    today: CalendarDay,
) -> Result<SyncOutcome, rusqlite::Error> {
    Ok(load_state(conn, identity)?
        .map(|state| state.last)
        .unwrap_or_else(|| SyncOutcome::pending(today)))
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn d(y: i32, m: u32, day: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                set_config(conn, "identity", "octocat")?;
                set_config(conn, "timeout_secs", "10")?;
                let val = get_config(conn, "identity")?;
                assert_eq!(val, Some("octocat".to_string()));

                let missing = get_config(conn, "nonexistent")?;
                assert_eq!(missing, None);

                set_config(conn, "identity", "hubot")?;
                let all = list_config(conn)?;
                assert_eq!(
                    all,
                    vec![
                        ("identity".to_string(), "hubot".to_string()),
                        ("timeout_secs".to_string(), "10".to_string()),
                    ]
                );
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_synced_outcome_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                let record = StreakRecord {
                    current: 3,
                    longest: 9,
                    last_active_date: Some(d(2024, 2, 29)),
                };
                let outcome = SyncOutcome::synced(record, d(2024, 3, 1));
                assert!(save_outcome(conn, "octocat", &outcome)?);

                let state = load_state(conn, "octocat")?.unwrap();
                assert_eq!(state.last, outcome);
                assert_eq!(state.streak, record);

                // Lookup ignores case
                assert!(load_state(conn, "OctoCat")?.is_some());
                assert!(load_state(conn, "hubot")?.is_none());
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_outcome_keeps_previous_streak() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                let record = StreakRecord {
                    current: 4,
                    longest: 4,
                    last_active_date: Some(d(2024, 3, 1)),
                };
                save_outcome(conn, "octocat", &SyncOutcome::synced(record, d(2024, 3, 1)))?;
                save_outcome(conn, "octocat", &SyncOutcome::error("timed out", d(2024, 3, 2)))?;

                let state = load_state(conn, "octocat")?.unwrap();
                assert_eq!(state.last, SyncOutcome::error("timed out", d(2024, 3, 2)));
                assert_eq!(state.streak, record);

                // A later success overwrites everything
                let fresh = StreakRecord::default();
                save_outcome(conn, "octocat", &SyncOutcome::synced(fresh, d(2024, 3, 3)))?;
                let state = load_state(conn, "octocat")?.unwrap();
                assert_eq!(state.streak, fresh);
                assert_eq!(state.last.status.as_str(), "synced");
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_before_any_success() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                save_outcome(conn, "octocat", &SyncOutcome::error("HTTP 500", d(2024, 3, 2)))?;
                let state = load_state(conn, "octocat")?.unwrap();
                assert_eq!(state.streak, StreakRecord::default());
                assert_eq!(state.last.attempted_on, d(2024, 3, 2));
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pending_outcome_not_stored() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                assert!(!save_outcome(conn, "octocat", &SyncOutcome::pending(d(2024, 3, 2)))?);
                assert!(load_state(conn, "octocat")?.is_none());
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_outcome_defaults_to_pending() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                assert_eq!(
                    load_outcome(conn, "octocat", d(2024, 3, 2))?,
                    SyncOutcome::pending(d(2024, 3, 2))
                );
                let record = StreakRecord {
                    current: 1,
                    longest: 4,
                    last_active_date: Some(d(2024, 3, 1)),
                };
                save_outcome(conn, "octocat", &SyncOutcome::synced(record, d(2024, 3, 1)))?;
                assert_eq!(
                    load_outcome(conn, "OCTOCAT", d(2024, 3, 2))?,
                    SyncOutcome::synced(record, d(2024, 3, 1))
                );
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }
}
