//! Collaborator trait definitions

use rq_util::UserId;
use thiserror::Error;
use tracing::warn;

/// Errors from host collaborator calls
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Delivery failed for {user}: {message}")]
    DeliveryFailed { user: UserId, message: String },
}

pub type HostResult<T> = Result<T, HostError>;

/// Delivers one plain-text message to one recipient
pub trait Notifier: Send + Sync {
    fn notify_user(&self, user: &UserId, message: &str) -> HostResult<()>;

    /// Send the same message to every user in `users`.
    ///
    /// A failed delivery is logged and does not stop the others.
    fn notify_many(&self, users: &[UserId], message: &str) {
        for user in users {
            if let Err(e) = self.notify_user(user, message) {
                warn!(user_id = %user, error = %e, "Notification failed");
            }
        }
    }
}

/// Resolves user ids to names and roles
pub trait Identity: Send + Sync {
    /// Human-readable name, falling back to the raw id
    fn display_name(&self, user: &UserId) -> String;

    /// Whether the user may administer resources
    fn is_privileged(&self, user: &UserId) -> bool;
}
