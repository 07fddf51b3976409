//! Storage Layer
//!
//! Persists completed study sessions, in SQLite or in memory.

mod repository;

pub use repository::{Repository, SessionRecord, TIME_FORMAT};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
