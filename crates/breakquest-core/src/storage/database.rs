//! SQLite-based persistence.
//!
//! Provides best-effort storage for:
//! - The completed-session counter and loot inventory (kv table)
//! - A log of completed phases for statistics (sessions table)
//! - Serialized engine state between CLI invocations (kv table)
//!
//! Malformed persisted values are treated as absent: callers get the
//! default/empty state back instead of an error.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::engine::{LootItem, SessionPhase};
use crate::error::DatabaseError;

const SESSIONS_TODAY_KEY: &str = "sessions_today";
const INVENTORY_KEY: &str = "inventory";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub phase: String,
    pub duration_min: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_focus_min: u64,
    pub total_break_min: u64,
    pub today_sessions: u64,
    pub today_focus_min: u64,
}

/// SQLite database at `~/.config/breakquest/breakquest.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default data directory.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("breakquest.db"))
    }

    /// Open the database at an explicit path (used by tests).
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for unit tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                phase        TEXT NOT NULL,
                duration_min INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )?;
        Ok(())
    }

    // ── Session log ──────────────────────────────────────────────────

    /// Record a completed phase to the session log.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        phase: SessionPhase,
        duration_min: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        let phase_str = match phase {
            SessionPhase::Work => "work",
            SessionPhase::Break => "break",
            SessionPhase::Idle => "idle",
        };
        self.conn.execute(
            "INSERT INTO sessions (phase, duration_min, completed_at)
             VALUES (?1, ?2, ?3)",
            params![phase_str, duration_min, completed_at.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recently completed phases, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, phase, duration_min, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, phase, duration_min, completed_at) = row.map_err(DatabaseError::from)?;
            let completed_at = completed_at
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| Utc::now());
            records.push(SessionRecord {
                id,
                phase,
                duration_min,
                completed_at,
            });
        }
        Ok(records)
    }

    /// Statistics restricted to sessions completed today (UTC).
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn stats_today(&self) -> Result<Stats, DatabaseError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.stats_since(Some(format!("{today}T00:00:00+00:00")))
    }

    /// All-time statistics.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        let mut stats = self.stats_since(None)?;
        let today = self.stats_today()?;
        stats.today_sessions = today.today_sessions;
        stats.today_focus_min = today.today_focus_min;
        Ok(stats)
    }

    fn stats_since(&self, cutoff: Option<String>) -> Result<Stats, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions
             WHERE completed_at >= COALESCE(?1, '')
             GROUP BY phase",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map(params![cutoff], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        for row in rows {
            let (phase, count, minutes) = row.map_err(DatabaseError::from)?;
            match phase.as_str() {
                "work" => {
                    stats.total_sessions += count;
                    stats.total_focus_min += minutes;
                    if cutoff.is_some() {
                        stats.today_sessions += count;
                        stats.today_focus_min += minutes;
                    }
                }
                "break" => {
                    stats.total_break_min += minutes;
                }
                _ => {}
            }
        }
        Ok(stats)
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    // ── Typed counters and inventory ─────────────────────────────────

    /// Completed focus-session count. Malformed or missing values read
    /// as zero.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn sessions_today(&self) -> Result<u64, DatabaseError> {
        Ok(self
            .kv_get(SESSIONS_TODAY_KEY)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    /// # Errors
    /// Returns an error if the write fails.
    pub fn set_sessions_today(&self, count: u64) -> Result<(), DatabaseError> {
        self.kv_set(SESSIONS_TODAY_KEY, &count.to_string())
    }

    /// Awarded loot in award order. Malformed or missing values read as
    /// an empty inventory.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn inventory(&self) -> Result<Vec<LootItem>, DatabaseError> {
        Ok(self
            .kv_get(INVENTORY_KEY)?
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default())
    }

    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save_inventory(&self, items: &[LootItem]) -> Result<(), DatabaseError> {
        let json =
            serde_json::to_string(items).map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.kv_set(INVENTORY_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LootItem;

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "world").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "world");
    }

    #[test]
    fn sessions_today_counter_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.sessions_today().unwrap(), 0);
        db.set_sessions_today(3).unwrap();
        assert_eq!(db.sessions_today().unwrap(), 3);
    }

    #[test]
    fn malformed_counter_reads_as_zero() {
        let db = Database::open_memory().unwrap();
        db.kv_set("sessions_today", "not a number").unwrap();
        assert_eq!(db.sessions_today().unwrap(), 0);
    }

    #[test]
    fn inventory_roundtrip_preserves_order() {
        let db = Database::open_memory().unwrap();
        assert!(db.inventory().unwrap().is_empty());

        let pool = LootItem::pool();
        let items = vec![pool[2].clone(), pool[0].clone(), pool[2].clone()];
        db.save_inventory(&items).unwrap();

        let loaded = db.inventory().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].name, pool[2].name);
        assert_eq!(loaded[1].name, pool[0].name);
        assert_eq!(loaded[2].name, pool[2].name);
    }

    #[test]
    fn malformed_inventory_reads_as_empty() {
        let db = Database::open_memory().unwrap();
        db.kv_set("inventory", "{ not json").unwrap();
        assert!(db.inventory().unwrap().is_empty());
    }

    #[test]
    fn session_log_feeds_stats() {
        let db = Database::open_memory().unwrap();
        db.record_session(SessionPhase::Work, 25, Utc::now()).unwrap();
        db.record_session(SessionPhase::Break, 5, Utc::now()).unwrap();
        db.record_session(SessionPhase::Work, 25, Utc::now()).unwrap();

        let today = db.stats_today().unwrap();
        assert_eq!(today.today_sessions, 2);
        assert_eq!(today.today_focus_min, 50);

        let all = db.stats_all().unwrap();
        assert_eq!(all.total_sessions, 2);
        assert_eq!(all.total_focus_min, 50);
        assert_eq!(all.total_break_min, 5);
    }

    #[test]
    fn recent_sessions_newest_first() {
        let db = Database::open_memory().unwrap();
        db.record_session(SessionPhase::Work, 25, Utc::now()).unwrap();
        db.record_session(SessionPhase::Break, 5, Utc::now()).unwrap();

        let recent = db.recent_sessions(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].phase, "break");
        assert_eq!(recent[1].phase, "work");

        assert_eq!(db.recent_sessions(1).unwrap().len(), 1);
    }
}
