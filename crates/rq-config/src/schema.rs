//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Booking, queue and field limits
    #[serde(default)]
    pub limits: RawLimits,

    /// Duration presets offered to users. Omitted means built-in presets.
    #[serde(default)]
    pub presets: Option<Vec<RawPreset>>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// User ids treated as privileged by the built-in identity provider
    #[serde(default)]
    pub admins: Vec<String>,
}

/// Numeric limits. Every key is optional and falls back to a default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLimits {
    pub max_booking_hours: Option<u64>,
    pub notify_before_minutes: Option<u64>,
    pub check_interval_seconds: Option<u64>,
    pub default_queue_minutes: Option<u64>,
    pub max_queue_size: Option<u64>,
    pub max_resources: Option<u64>,
    pub max_history: Option<u64>,

    pub max_name_len: Option<u64>,
    pub max_location_len: Option<u64>,
    pub max_icon_len: Option<u64>,
    pub max_description_len: Option<u64>,
    pub max_purpose_len: Option<u64>,
    pub max_metadata_entries: Option<u64>,
    pub max_metadata_key_len: Option<u64>,
    pub max_metadata_value_len: Option<u64>,
}

impl RawLimits {
    /// All keys with their configured values, for validation and reporting
    pub fn entries(&self) -> [(&'static str, Option<u64>); 15] {
        [
            ("max_booking_hours", self.max_booking_hours),
            ("notify_before_minutes", self.notify_before_minutes),
            ("check_interval_seconds", self.check_interval_seconds),
            ("default_queue_minutes", self.default_queue_minutes),
            ("max_queue_size", self.max_queue_size),
            ("max_resources", self.max_resources),
            ("max_history", self.max_history),
            ("max_name_len", self.max_name_len),
            ("max_location_len", self.max_location_len),
            ("max_icon_len", self.max_icon_len),
            ("max_description_len", self.max_description_len),
            ("max_purpose_len", self.max_purpose_len),
            ("max_metadata_entries", self.max_metadata_entries),
            ("max_metadata_key_len", self.max_metadata_key_len),
            ("max_metadata_value_len", self.max_metadata_value_len),
        ]
    }
}

/// A named booking duration offered as a shortcut
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPreset {
    pub label: String,
    pub minutes: i64,
}
