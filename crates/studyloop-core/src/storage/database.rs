//! SQLite-based session storage and statistics.
//!
//! Stores completed work sessions with their tags and notes, and serves
//! the statistics queries behind `studyloop stats`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::data_dir;
use crate::error::{DatabaseError, RecorderError, Result};
use crate::recorder::SessionRecorder;
use crate::session::CompletedSession;

/// Aggregate statistics over recorded work sessions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_focus_secs: u64,
    pub today_sessions: u64,
    pub today_focus_secs: u64,
}

/// SQLite database for completed work sessions.
///
/// The connection sits behind a mutex so the database can serve as a
/// shared [`SessionRecorder`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/studyloop/studyloop.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("studyloop.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id           TEXT PRIMARY KEY,
                    duration_secs INTEGER NOT NULL,
                    tags         TEXT NOT NULL DEFAULT '[]',
                    notes        TEXT NOT NULL DEFAULT '',
                    completed_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_completed_at
                    ON sessions(completed_at);",
            )
            .map_err(DatabaseError::from)
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    /// Insert one completed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, session: &CompletedSession) -> Result<(), DatabaseError> {
        let tags = serde_json::to_string(&session.tags)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn().execute(
            "INSERT INTO sessions (id, duration_secs, tags, notes, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id.to_string(),
                session.duration_secs,
                tags,
                session.notes,
                session.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The most recently completed sessions, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<CompletedSession>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, duration_secs, tags, notes, completed_at
             FROM sessions
             ORDER BY completed_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, duration_secs, tags, notes, completed_at) = row?;
            sessions.push(CompletedSession {
                id: id
                    .parse()
                    .map_err(|_| DatabaseError::QueryFailed(format!("bad session id: {id}")))?,
                duration_secs,
                tags: serde_json::from_str(&tags).unwrap_or_default(),
                notes,
                completed_at: DateTime::parse_from_rfc3339(&completed_at)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
                    .with_timezone(&Utc),
            });
        }
        Ok(sessions)
    }

    pub fn stats_today(&self) -> Result<Stats, DatabaseError> {
        let midnight = Utc::now().format("%Y-%m-%d").to_string();
        self.stats_since(Some(&format!("{midnight}T00:00:00+00:00")))
    }

    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        let mut stats = self.stats_since(None)?;
        let today = self.stats_today()?;
        stats.today_sessions = today.today_sessions;
        stats.today_focus_secs = today.today_focus_secs;
        Ok(stats)
    }

    fn stats_since(&self, since: Option<&str>) -> Result<Stats, DatabaseError> {
        let conn = self.conn();
        let (count, secs): (u64, u64) = match since {
            Some(since) => conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
                 FROM sessions WHERE completed_at >= ?1",
                params![since],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0) FROM sessions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
        };
        let mut stats = Stats {
            total_sessions: count,
            total_focus_secs: secs,
            ..Stats::default()
        };
        if since.is_some() {
            stats.today_sessions = count;
            stats.today_focus_secs = secs;
        }
        Ok(stats)
    }
}

#[async_trait]
impl SessionRecorder for Database {
    async fn record(&self, session: &CompletedSession) -> Result<(), RecorderError> {
        self.record_session(session)?;
        Ok(())
    }
}
