//! Store trait definitions

use crate::StoreResult;

/// Keyed store of opaque values.
///
/// Each call touches exactly one key. There are no transactions and no
/// compare-and-swap, so callers doing read-modify-write must serialize
/// themselves.
pub trait KvStore: Send + Sync {
    /// Read the value under `key`, if any
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
