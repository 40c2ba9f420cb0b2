//! Bounded log of completed sessions

use rq_store::{JsonRecords, history_key};
use rq_util::{ResourceId, Result};
use tracing::debug;

use crate::{CoreEngine, HistoryEntry};

impl CoreEngine {
    /// Append a completed session, dropping the oldest beyond the cap
    pub fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        let id = entry.resource_id.clone();
        self.locks.with_resource(&id, || {
            self.get_resource(&id)?;
            self.push_history(entry)
        })
    }

    /// Most recent sessions first. A `limit` of 0 returns everything kept.
    pub fn history(&self, id: &ResourceId, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> =
            self.store.get_json(&history_key(id))?.unwrap_or_default();
        entries.sort_by(|a, b| b.start.cmp(&a.start));
        if limit > 0 {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// A session is identified by its holder and start. Recording the same
    /// session again replaces the earlier entry, so a close-out retried
    /// after a failed booking delete does not duplicate it.
    ///
    /// Caller must hold the resource lock.
    pub(crate) fn push_history(&self, entry: HistoryEntry) -> Result<()> {
        let key = history_key(&entry.resource_id);
        let max = self.settings().limits.max_history;
        let mut entries: Vec<HistoryEntry> = self.store.get_json(&key)?.unwrap_or_default();

        if let Some(existing) = entries
            .iter_mut()
            .find(|e| e.user_id == entry.user_id && e.start == entry.start)
        {
            debug!(user_id = %entry.user_id, "Replacing recorded session");
            *existing = entry;
            self.store.put_json(&key, &entries)?;
            return Ok(());
        }

        entries.push(entry);
        if entries.len() > max {
            let excess = entries.len() - max;
            entries.drain(..excess);
            debug!(dropped = excess, "History trimmed");
        }
        self.store.put_json(&key, &entries)?;
        Ok(())
    }
}
