//! SQLite persistence for explanation records, profiles, settings, and
//! history.
//!
//! [`Database`] is one SQLite handle with the full schema. [`Store`] wraps
//! a primary database plus a secondary fallback: infrastructure failures
//! on the primary degrade transparently to the fallback so a corrupt or
//! locked primary file never takes explanations down with it.

mod database;
mod store;

pub use database::Database;
pub use store::Store;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("maximum number of profiles reached ({0})")]
    ProfileLimit(usize),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Directory holding the databases, created on demand by callers.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sublens")
}

/// Default path of the primary database.
pub fn primary_db_path() -> PathBuf {
    default_data_dir().join("sublens.db")
}

/// Default path of the secondary fallback database.
pub fn fallback_db_path() -> PathBuf {
    default_data_dir().join("sublens-fallback.db")
}
