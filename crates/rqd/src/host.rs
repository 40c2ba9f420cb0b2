//! Built-in collaborators for running without a chat platform

use rq_config::SettingsHandle;
use rq_host_api::{HostResult, Identity, Notifier};
use rq_util::UserId;
use tracing::info;

/// Notifier that writes every message to the log. Delivery to users is
/// left to whatever consumes the log stream.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_user(&self, user: &UserId, message: &str) -> HostResult<()> {
        info!(user_id = %user, text = message, "Notification");
        Ok(())
    }
}

/// Identity provider backed by the `[service]` admins list. Display names
/// are the raw user ids.
pub struct ConfigIdentity {
    settings: SettingsHandle,
}

impl ConfigIdentity {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }
}

impl Identity for ConfigIdentity {
    fn display_name(&self, user: &UserId) -> String {
        user.to_string()
    }

    fn is_privileged(&self, user: &UserId) -> bool {
        self.settings.current().is_admin(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rq_config::parse_config;

    #[test]
    fn admins_follow_reloads() {
        let handle = SettingsHandle::default();
        let identity = ConfigIdentity::new(handle.clone());
        let alice = UserId::new("alice");
        assert!(!identity.is_privileged(&alice));

        let settings = parse_config("config_version = 1\n[service]\nadmins = [\"alice\"]").unwrap();
        handle.replace(settings);
        assert!(identity.is_privileged(&alice));
        assert_eq!(identity.display_name(&alice), "alice");
    }

    #[test]
    fn log_notifier_never_fails() {
        assert!(LogNotifier.notify_user(&UserId::new("u1"), "hello").is_ok());
    }
}
