//! Mock host for testing

use rq_util::UserId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::{HostError, HostResult, Identity, Notifier};

/// A message captured by [`MockHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: UserId,
    pub text: String,
}

/// Recording notifier and identity provider for unit/integration testing
#[derive(Default)]
pub struct MockHost {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    admins: Arc<Mutex<HashSet<UserId>>>,
    names: Arc<Mutex<HashMap<UserId, String>>>,

    /// Configure delivery to fail
    pub fail_notify: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(self, user: impl Into<UserId>) -> Self {
        self.admins.lock().unwrap().insert(user.into());
        self
    }

    pub fn with_name(self, user: impl Into<UserId>, name: impl Into<String>) -> Self {
        self.names.lock().unwrap().insert(user.into(), name.into());
        self
    }

    /// All messages delivered so far, in order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages delivered to one user, in order
    pub fn sent_to(&self, user: &UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.to == user)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Notifier for MockHost {
    fn notify_user(&self, user: &UserId, message: &str) -> HostResult<()> {
        if *self.fail_notify.lock().unwrap() {
            return Err(HostError::DeliveryFailed {
                user: user.clone(),
                message: "Mock failure".into(),
            });
        }

        self.sent.lock().unwrap().push(SentMessage {
            to: user.clone(),
            text: message.to_string(),
        });
        Ok(())
    }
}

impl Identity for MockHost {
    fn display_name(&self, user: &UserId) -> String {
        self.names
            .lock()
            .unwrap()
            .get(user)
            .cloned()
            .unwrap_or_else(|| user.to_string())
    }

    fn is_privileged(&self, user: &UserId) -> bool {
        self.admins.lock().unwrap().contains(user)
    }
}
