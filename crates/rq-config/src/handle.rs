//! Runtime-reloadable settings

use crate::{ConfigResult, Settings, load_config};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Shared, swappable settings.
///
/// Readers call [`SettingsHandle::current`] on every operation so a reload
/// takes effect on the next call without restarting anything.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Arc<Settings>>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// Snapshot of the settings in effect right now
    pub fn current(&self) -> Arc<Settings> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in new settings
    pub fn replace(&self, settings: Settings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
    }

    /// Load, validate and swap in settings from a file.
    ///
    /// On error the previous settings stay in effect.
    pub fn reload_from(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let settings = load_config(path)?;
        self.replace(settings);
        info!(path = %path.display(), "Configuration reloaded");
        Ok(())
    }
}
