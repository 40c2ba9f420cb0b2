//! Core booking engine
//!
//! `CoreEngine` owns the collaborators and the lock table. Its operations
//! are spread over the directory, ledger, queue, subscriptions, history,
//! status and scheduler modules, each adding an `impl CoreEngine` block.

use rq_config::{Settings, SettingsHandle};
use rq_host_api::{Identity, Notifier};
use rq_store::KvStore;
use rq_util::UserId;
use std::sync::Arc;
use tracing::{debug, info};

use crate::locks::LockTable;
use crate::messages::Outbox;

/// The core booking engine
pub struct CoreEngine {
    pub(crate) store: Arc<dyn KvStore>,
    notifier: Arc<dyn Notifier>,
    identity: Arc<dyn Identity>,
    settings: SettingsHandle,
    pub(crate) locks: LockTable,
}

impl CoreEngine {
    /// Create a new core engine
    pub fn new(
        store: Arc<dyn KvStore>,
        notifier: Arc<dyn Notifier>,
        identity: Arc<dyn Identity>,
        settings: SettingsHandle,
    ) -> Self {
        let current = settings.current();
        info!(
            max_booking_minutes = current.limits.max_booking_minutes(),
            max_resources = current.limits.max_resources,
            "Core engine initialized"
        );

        Self {
            store,
            notifier,
            identity,
            settings,
            locks: LockTable::new(),
        }
    }

    /// Settings in effect for the current call
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.current()
    }

    /// Whether the identity provider treats `user` as an admin
    pub fn is_admin(&self, user: &UserId) -> bool {
        self.identity.is_privileged(user)
    }

    pub fn display_name(&self, user: &UserId) -> String {
        self.identity.display_name(user)
    }

    pub fn is_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    /// Deliver collected messages. Failures are logged by the notifier.
    pub(crate) fn deliver(&self, outbox: Outbox) {
        for (users, text) in outbox.into_items() {
            debug!(recipients = users.len(), "Delivering notification");
            self.notifier.notify_many(&users, &text);
        }
    }
}
