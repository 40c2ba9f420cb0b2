//! Typed JSON records on top of a [`KvStore`]

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{KvStore, StoreResult};

/// JSON (de)serialization helpers available on every store
pub trait JsonRecords {
    /// Read and decode the record under `key`
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>>;

    /// Encode and write `value` under `key`
    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()>;
}

impl<S: KvStore + ?Sized> JsonRecords for S {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        debug!(key, len = bytes.len(), "Writing record");
        self.set(key, bytes)
    }
}
