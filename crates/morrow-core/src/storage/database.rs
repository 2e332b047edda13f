//! SQLite-backed persistence for the engine's boundary contracts.
//!
//! One table per store: profiles, check-ins (append-only), protocols,
//! action sessions (append-only, deduplicated), briefs. The engine
//! itself never touches the connection; callers load snapshots, run the
//! pure operations, and persist the results here.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::brief::Brief;
use crate::checkin::{CheckIn, CheckInPayload, Trigger};
use crate::error::{DatabaseError, Result};
use crate::profile::Profile;
use crate::protocol::assigner::Assignment;
use crate::protocol::{ActionSession, ProtocolStatus, RecoveryProtocol};

use super::data_dir;

/// SQLite database for all morrow state.
pub struct Database {
    conn: Connection,
}

fn parse_ts(text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_uuid(text: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str) -> rusqlite::Result<T> {
    serde_json::from_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_named<T>(text: &str, parse: impl Fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown value '{text}'").into(),
        )
    })
}

fn protocol_from_row(row: &rusqlite::Row) -> rusqlite::Result<RecoveryProtocol> {
    use crate::checkin::{EventIntensity, EventType};
    Ok(RecoveryProtocol {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        user_id: parse_uuid(&row.get::<_, String>(1)?)?,
        event_type: parse_named(&row.get::<_, String>(2)?, EventType::from_name)?,
        intensity: parse_named(&row.get::<_, String>(3)?, EventIntensity::from_name)?,
        total_days: row.get(4)?,
        current_day: row.get(5)?,
        status: parse_named(&row.get::<_, String>(6)?, ProtocolStatus::from_name)?,
        origin_checkin_id: parse_uuid(&row.get::<_, String>(7)?)?,
        created_at: parse_ts(&row.get::<_, String>(8)?)?,
    })
}

fn write_protocol(
    conn: &Connection,
    protocol: &RecoveryProtocol,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO protocols
             (id, user_id, event_type, intensity, total_days, current_day, status,
              origin_checkin_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             current_day = excluded.current_day,
             status = excluded.status",
        params![
            protocol.id.to_string(),
            protocol.user_id.to_string(),
            protocol.event_type.name(),
            protocol.intensity.name(),
            protocol.total_days,
            protocol.current_day,
            protocol.status.name(),
            protocol.origin_checkin_id.to_string(),
            protocol.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/morrow/morrow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("morrow.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS profiles (
                    id          TEXT PRIMARY KEY,
                    conditions  TEXT NOT NULL,
                    entitlement TEXT NOT NULL,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS checkins (
                    id          TEXT PRIMARY KEY,
                    user_id     TEXT NOT NULL,
                    trig        TEXT NOT NULL,
                    recorded_at TEXT NOT NULL,
                    payload     TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS protocols (
                    id                TEXT PRIMARY KEY,
                    user_id           TEXT NOT NULL,
                    event_type        TEXT NOT NULL,
                    intensity         TEXT NOT NULL,
                    total_days        INTEGER NOT NULL,
                    current_day       INTEGER NOT NULL,
                    status            TEXT NOT NULL,
                    origin_checkin_id TEXT NOT NULL,
                    created_at        TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS action_sessions (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    protocol_id TEXT NOT NULL,
                    day         INTEGER NOT NULL,
                    action_id   TEXT NOT NULL,
                    completed   INTEGER NOT NULL,
                    recorded_at TEXT NOT NULL,
                    UNIQUE(protocol_id, day, action_id)
                );

                CREATE TABLE IF NOT EXISTS briefs (
                    id           TEXT PRIMARY KEY,
                    user_id      TEXT NOT NULL,
                    generated_at TEXT NOT NULL,
                    is_read      INTEGER NOT NULL DEFAULT 0,
                    payload      TEXT NOT NULL
                );

                -- Indexes for the range queries the aggregator issues
                CREATE INDEX IF NOT EXISTS idx_checkins_user_recorded
                    ON checkins(user_id, recorded_at);
                CREATE INDEX IF NOT EXISTS idx_protocols_user_status
                    ON protocols(user_id, status);
                CREATE INDEX IF NOT EXISTS idx_sessions_protocol_day
                    ON action_sessions(protocol_id, day);
                CREATE INDEX IF NOT EXISTS idx_briefs_user_generated
                    ON briefs(user_id, generated_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Profiles ─────────────────────────────────────────────────────

    pub fn upsert_profile(&self, profile: &Profile) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO profiles (id, conditions, entitlement, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 conditions = excluded.conditions,
                 entitlement = excluded.entitlement",
            params![
                profile.id.to_string(),
                serde_json::to_string(&profile.conditions)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                serde_json::to_string(&profile.entitlement)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                profile.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, conditions, entitlement, created_at FROM profiles WHERE id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok(Profile {
                        id: parse_uuid(&row.get::<_, String>(0)?)?,
                        conditions: parse_json(&row.get::<_, String>(1)?)?,
                        entitlement: parse_json(&row.get::<_, String>(2)?)?,
                        created_at: parse_ts(&row.get::<_, String>(3)?)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // ── Check-ins (append-only) ──────────────────────────────────────

    pub fn insert_checkin(&self, checkin: &CheckIn) -> Result<(), DatabaseError> {
        let trig = match checkin.trigger() {
            Trigger::Morning => "morning",
            Trigger::PostEvent => "post_event",
            Trigger::Midday => "midday",
        };
        self.conn.execute(
            "INSERT INTO checkins (id, user_id, trig, recorded_at, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                checkin.id.to_string(),
                checkin.user_id.to_string(),
                trig,
                checkin.recorded_at.to_rfc3339(),
                serde_json::to_string(&checkin.payload)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
            ],
        )?;
        Ok(())
    }

    /// Range query used by the brief aggregator: all of a user's
    /// check-ins recorded at or after `since`, oldest first.
    pub fn checkins_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CheckIn>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, recorded_at, payload
             FROM checkins
             WHERE user_id = ?1 AND recorded_at >= ?2
             ORDER BY recorded_at ASC",
        )?;
        let rows = stmt.query_map(
            params![user_id.to_string(), since.to_rfc3339()],
            |row| {
                Ok(CheckIn {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    user_id: parse_uuid(&row.get::<_, String>(1)?)?,
                    recorded_at: parse_ts(&row.get::<_, String>(2)?)?,
                    payload: parse_json::<CheckInPayload>(&row.get::<_, String>(3)?)?,
                })
            },
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)
    }

    // ── Protocols ────────────────────────────────────────────────────

    const PROTOCOL_COLUMNS: &'static str =
        "id, user_id, event_type, intensity, total_days, current_day, status, origin_checkin_id, created_at";

    pub fn active_protocol(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RecoveryProtocol>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM protocols WHERE user_id = ?1 AND status = 'active'
             ORDER BY created_at DESC LIMIT 1",
            Self::PROTOCOL_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, params![user_id.to_string()], protocol_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn protocol(&self, id: Uuid) -> Result<RecoveryProtocol, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM protocols WHERE id = ?1",
            Self::PROTOCOL_COLUMNS
        );
        self.conn
            .query_row(&sql, params![id.to_string()], protocol_from_row)
            .map_err(DatabaseError::from)
    }

    /// Persist an assignment atomically: the superseded protocol's
    /// final status and the new active protocol land in one
    /// transaction, preserving the single-active invariant.
    pub fn apply_assignment(&mut self, assignment: &Assignment) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        if let Some(superseded) = &assignment.superseded {
            write_protocol(&tx, superseded)?;
        }
        write_protocol(&tx, &assignment.protocol)?;
        tx.commit()?;
        Ok(())
    }

    /// Update current_day/status after a progression transition.
    pub fn update_protocol(&self, protocol: &RecoveryProtocol) -> Result<(), DatabaseError> {
        write_protocol(&self.conn, protocol)
    }

    // ── Action sessions (append-only) ────────────────────────────────

    /// Insert a session. Retried writes of the same
    /// (protocol_id, day, action_id) are deduplicated here, not by the
    /// engine. Returns whether a new row landed.
    pub fn insert_session(&self, session: &ActionSession) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO action_sessions
                 (protocol_id, day, action_id, completed, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.protocol_id.to_string(),
                session.day,
                session.action_id,
                session.completed as i64,
                session.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn sessions_for(&self, protocol_id: Uuid) -> Result<Vec<ActionSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT protocol_id, day, action_id, completed, recorded_at
             FROM action_sessions
             WHERE protocol_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![protocol_id.to_string()], |row| {
            Ok(ActionSession {
                protocol_id: parse_uuid(&row.get::<_, String>(0)?)?,
                day: row.get(1)?,
                action_id: row.get(2)?,
                completed: row.get::<_, i64>(3)? != 0,
                recorded_at: parse_ts(&row.get::<_, String>(4)?)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)
    }

    /// All completed/skipped sessions for a user since `since` (joined
    /// through the user's protocols), for the aggregator.
    pub fn sessions_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActionSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.protocol_id, s.day, s.action_id, s.completed, s.recorded_at
             FROM action_sessions s
             JOIN protocols p ON p.id = s.protocol_id
             WHERE p.user_id = ?1 AND s.recorded_at >= ?2
             ORDER BY s.recorded_at ASC",
        )?;
        let rows = stmt.query_map(
            params![user_id.to_string(), since.to_rfc3339()],
            |row| {
                Ok(ActionSession {
                    protocol_id: parse_uuid(&row.get::<_, String>(0)?)?,
                    day: row.get(1)?,
                    action_id: row.get(2)?,
                    completed: row.get::<_, i64>(3)? != 0,
                    recorded_at: parse_ts(&row.get::<_, String>(4)?)?,
                })
            },
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)
    }

    // ── Briefs ───────────────────────────────────────────────────────

    pub fn insert_brief(&self, brief: &Brief) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO briefs (id, user_id, generated_at, is_read, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                brief.id.to_string(),
                brief.user_id.to_string(),
                brief.generated_at.to_rfc3339(),
                brief.is_read as i64,
                serde_json::to_string(brief)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
            ],
        )?;
        Ok(())
    }

    pub fn latest_brief(&self, user_id: Uuid) -> Result<Option<Brief>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, is_read FROM briefs
                 WHERE user_id = ?1
                 ORDER BY generated_at DESC LIMIT 1",
                params![user_id.to_string()],
                |row| {
                    let mut brief: Brief = parse_json(&row.get::<_, String>(0)?)?;
                    // The column is authoritative for is_read.
                    brief.is_read = row.get::<_, i64>(1)? != 0;
                    Ok(brief)
                },
            )
            .optional()?;
        Ok(row)
    }

    /// The one allowed is_read mutation: false -> true. Returns whether
    /// this call performed the transition.
    pub fn mark_brief_read(&self, brief_id: Uuid) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE briefs SET is_read = 1 WHERE id = ?1 AND is_read = 0",
            params![brief_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// Weeks with a generated-and-viewed brief; feeds insight-tier
    /// gating.
    pub fn completed_viewed_weeks(&self, user_id: Uuid) -> Result<u32, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM briefs WHERE user_id = ?1 AND is_read = 1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}
