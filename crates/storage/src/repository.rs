//! Repository Implementation

use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::StorageError;

/// Timestamp format of `start_time`/`end_time` columns
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CREATE_SQL: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT,
    start_time TEXT,
    end_time TEXT,
    focused_seconds INTEGER,
    distracted_seconds INTEGER,
    drowsy_seconds INTEGER,
    alerts INTEGER
)";

/// Completed study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Assigned on insert
    pub id: i64,
    pub username: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub focused_seconds: i64,
    pub distracted_seconds: i64,
    pub drowsy_seconds: i64,
    pub alerts: i64,
}

enum Backend {
    Memory {
        sessions: Mutex<Vec<SessionRecord>>,
        next_id: Mutex<i64>,
    },
    Sqlite(SqlitePool),
}

/// Repository for session records
pub struct Repository {
    backend: Backend,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            backend: Backend::Memory {
                sessions: Mutex::new(Vec::new()),
                next_id: Mutex::new(1),
            },
        }
    }

    /// Open (or create) a SQLite database, e.g. `sqlite://study_sessions.db`
    pub async fn with_sqlite(db_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(db_error)?
            .create_if_missing(true);

        // A single long-lived connection keeps `sqlite::memory:` databases alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        sqlx::query(CREATE_SQL)
            .execute(&pool)
            .await
            .map_err(db_error)?;

        info!("Opened session database {}", db_url);
        Ok(Self {
            backend: Backend::Sqlite(pool),
        })
    }

    /// Insert a session record, returns its id
    pub async fn insert_session(&self, mut record: SessionRecord) -> Result<i64, StorageError> {
        let id = match &self.backend {
            Backend::Memory { sessions, next_id } => {
                let mut sessions = sessions.lock().map_err(|e| {
                    StorageError::DatabaseError(format!("Lock error: {}", e))
                })?;
                let mut next_id = next_id.lock().map_err(|e| {
                    StorageError::DatabaseError(format!("Lock error: {}", e))
                })?;

                record.id = *next_id;
                *next_id += 1;
                let id = record.id;
                sessions.push(record);
                id
            }
            Backend::Sqlite(pool) => sqlx::query(
                "INSERT INTO sessions(username, start_time, end_time, focused_seconds, \
                 distracted_seconds, drowsy_seconds, alerts) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.username)
            .bind(record.start_time.format(TIME_FORMAT).to_string())
            .bind(record.end_time.format(TIME_FORMAT).to_string())
            .bind(record.focused_seconds)
            .bind(record.distracted_seconds)
            .bind(record.drowsy_seconds)
            .bind(record.alerts)
            .execute(pool)
            .await
            .map_err(db_error)?
            .last_insert_rowid(),
        };

        debug!("Inserted session with ID {}", id);
        Ok(id)
    }

    /// All sessions, newest first
    pub async fn fetch_all(&self) -> Result<Vec<SessionRecord>, StorageError> {
        match &self.backend {
            Backend::Memory { sessions, .. } => {
                let sessions = sessions.lock().map_err(|e| {
                    StorageError::DatabaseError(format!("Lock error: {}", e))
                })?;
                Ok(sessions.iter().rev().cloned().collect())
            }
            Backend::Sqlite(pool) => {
                let rows = sqlx::query("SELECT * FROM sessions ORDER BY id DESC")
                    .fetch_all(pool)
                    .await
                    .map_err(db_error)?;
                rows.iter().map(record_from_row).collect()
            }
        }
    }

    /// Look up one session
    pub async fn get_session(&self, id: i64) -> Result<SessionRecord, StorageError> {
        self.fetch_all()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(StorageError::NotFound)
    }

    /// Number of stored sessions
    pub async fn session_count(&self) -> Result<usize, StorageError> {
        Ok(self.fetch_all().await?.len())
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

fn db_error(e: sqlx::Error) -> StorageError {
    StorageError::DatabaseError(e.to_string())
}

fn record_from_row(row: &SqliteRow) -> Result<SessionRecord, StorageError> {
    let time = |column: &str| -> Result<NaiveDateTime, StorageError> {
        let text: String = row.try_get(column).map_err(db_error)?;
        NaiveDateTime::parse_from_str(&text, TIME_FORMAT).map_err(|e| {
            StorageError::SerializationError(format!("{} '{}': {}", column, text, e))
        })
    };

    Ok(SessionRecord {
        id: row.try_get("id").map_err(db_error)?,
        username: row
            .try_get::<Option<String>, _>("username")
            .map_err(db_error)?
            .unwrap_or_default(),
        start_time: time("start_time")?,
        end_time: time("end_time")?,
        focused_seconds: row.try_get("focused_seconds").map_err(db_error)?,
        distracted_seconds: row.try_get("distracted_seconds").map_err(db_error)?,
        drowsy_seconds: row.try_get("drowsy_seconds").map_err(db_error)?,
        alerts: row.try_get("alerts").map_err(db_error)?,
    })
}
