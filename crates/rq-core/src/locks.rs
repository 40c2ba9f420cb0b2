//! Per-resource mutual exclusion
//!
//! The store has no transactions, so every read-modify-write on a
//! resource's records runs while holding that resource's lock. Operations
//! on different resources never contend. The directory id list has a lock
//! of its own; when both are needed the directory lock is taken first.
//!
//! Entries are never removed, so every caller for an id shares one mutex
//! even across a delete. Operations must re-check that the resource still
//! exists once they hold its lock.

use dashmap::DashMap;
use rq_util::ResourceId;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct LockTable {
    resources: DashMap<ResourceId, Arc<Mutex<()>>>,
    directory: Mutex<()>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `id`
    pub fn with_resource<T>(&self, id: &ResourceId, f: impl FnOnce() -> T) -> T {
        // Clone the Arc out so the map shard is not held while `f` runs
        let lock = self.resources.entry(id.clone()).or_default().clone();
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` while holding the directory lock
    pub fn with_directory<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.directory.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
