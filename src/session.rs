use std::cell::{Cell, RefCell};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::types::TopicResult;
use crate::error::SessionError;

/// Key the record is stored under.
pub const SESSION_KEY: &str = "brandData";

/// Key of the request generation counter, shared by every process using the file.
pub const GENERATION_KEY: &str = "generation";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The user's last submission and what the backend returned for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub domain: String,
    pub topics: Vec<String>,
    pub results: Vec<TopicResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(domain: impl Into<String>, topics: Vec<String>, results: Vec<TopicResult>) -> Self {
        Self {
            domain: domain.into(),
            topics,
            results,
            saved_at: None,
        }
    }
}

pub trait SessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError>;

    /// Replace whatever is stored with `record`.
    fn save(&self, record: &SessionRecord) -> Result<(), SessionError>;

    /// Remove the record and supersede any request still in flight.
    fn clear(&self) -> Result<(), SessionError>;

    /// The latest request generation; 0 before any request.
    fn generation(&self) -> Result<u64, SessionError>;

    /// Start a new request generation and return it.
    fn begin_request(&self) -> Result<u64, SessionError>;

    /// Save `record` only if `generation` is still the latest. Returns
    /// whether the record was written.
    fn save_if_current(&self, record: &SessionRecord, generation: u64) -> Result<bool, SessionError>;
}

/// Key-value table in a local SQLite file holding the record as JSON.
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    pub fn open(db_path: &Path) -> Result<Self, SessionError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init(&conn)?;

        info!(action = "open", component = "session_store", path = ?db_path, "Opened session store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SessionError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> Result<(), SessionError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl SqliteSessionStore {
    fn read_generation(conn: &Connection) -> Result<u64, SessionError> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![GENERATION_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    fn write_generation(conn: &Connection, generation: u64) -> Result<(), SessionError> {
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![GENERATION_KEY, generation.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn write_record(conn: &Connection, record: &SessionRecord) -> Result<SessionRecord, SessionError> {
        let now = Utc::now();
        let mut record = record.clone();
        record.saved_at = Some(now);
        let json = serde_json::to_string(&record)?;

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![SESSION_KEY, json, now.to_rfc3339()],
        )?;
        Ok(record)
    }

    /// Write-locking transaction so concurrent processes serialize on the counter.
    fn immediate(&self) -> Result<Transaction<'_>, SessionError> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![SESSION_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let record = Self::write_record(&self.conn, record)?;
        info!(
            action = "save",
            component = "session_store",
            domain = %record.domain,
            topic_count = record.topics.len(),
            result_count = record.results.len(),
            "Saved session record"
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let tx = self.immediate()?;
        let generation = Self::read_generation(&self.conn)? + 1;
        Self::write_generation(&self.conn, generation)?;
        let removed = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![SESSION_KEY])?;
        tx.commit()?;

        info!(action = "clear", component = "session_store", removed, generation, "Cleared session record");
        Ok(())
    }

    fn generation(&self) -> Result<u64, SessionError> {
        Self::read_generation(&self.conn)
    }

    fn begin_request(&self) -> Result<u64, SessionError> {
        let tx = self.immediate()?;
        let generation = Self::read_generation(&self.conn)? + 1;
        Self::write_generation(&self.conn, generation)?;
        tx.commit()?;
        Ok(generation)
    }

    fn save_if_current(&self, record: &SessionRecord, generation: u64) -> Result<bool, SessionError> {
        let tx = self.immediate()?;
        let latest = Self::read_generation(&self.conn)?;
        if latest != generation {
            info!(action = "skip", component = "session_store", generation, latest, "Request superseded, not saving");
            return Ok(false);
        }

        let record = Self::write_record(&self.conn, record)?;
        tx.commit()?;

        info!(
            action = "save",
            component = "session_store",
            domain = %record.domain,
            result_count = record.results.len(),
            generation,
            "Saved session record"
        );
        Ok(true)
    }
}

/// Process-local store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: RefCell<Option<SessionRecord>>,
    generation: Cell<u64>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: RefCell::new(Some(record)),
            generation: Cell::new(0),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError> {
        Ok(self.record.borrow().clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let mut record = record.clone();
        record.saved_at = Some(Utc::now());
        *self.record.borrow_mut() = Some(record);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.generation.set(self.generation.get() + 1);
        self.record.borrow_mut().take();
        Ok(())
    }

    fn generation(&self) -> Result<u64, SessionError> {
        Ok(self.generation.get())
    }

    fn begin_request(&self) -> Result<u64, SessionError> {
        self.generation.set(self.generation.get() + 1);
        Ok(self.generation.get())
    }

    fn save_if_current(&self, record: &SessionRecord, generation: u64) -> Result<bool, SessionError> {
        if self.generation.get() != generation {
            return Ok(false);
        }
        self.save(record)?;
        Ok(true)
    }
}
