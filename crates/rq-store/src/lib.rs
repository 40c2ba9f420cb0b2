//! Keyed record storage for rqd
//!
//! Provides:
//! - A minimal get/set/delete store trait with no transactions
//! - The key scheme for per-resource records
//! - Typed JSON helpers on top of raw values
//! - SQLite-backed and in-memory implementations

mod keys;
mod memory;
mod records;
mod sqlite;
mod traits;

pub use keys::*;
pub use memory::*;
pub use records::*;
pub use sqlite::*;
pub use traits::*;

use rq_util::RqError;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for RqError {
    fn from(e: StoreError) -> Self {
        RqError::StorageFailure(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
