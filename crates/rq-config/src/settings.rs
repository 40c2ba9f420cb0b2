//! Validated settings structures

use crate::schema::{RawConfig, RawLimits, RawPreset, RawServiceConfig};
use chrono::Duration;
use rq_util::{UserId, default_data_dir};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_MAX_BOOKING_HOURS: u64 = 24;
pub const DEFAULT_NOTIFY_BEFORE_MINUTES: u64 = 10;
pub const DEFAULT_CHECK_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_QUEUE_MINUTES: u64 = 60;
pub const DEFAULT_MAX_QUEUE_SIZE: u64 = 20;
pub const DEFAULT_MAX_RESOURCES: u64 = 100;
pub const DEFAULT_MAX_HISTORY: u64 = 50;

/// Upper bounds for the time limits: one year of booking, a booking-length
/// window, and one sweep a day.
pub const MAX_BOOKING_HOURS_LIMIT: u64 = 366 * 24;
pub const MAX_WINDOW_MINUTES: u64 = MAX_BOOKING_HOURS_LIMIT * 60;
pub const MAX_CHECK_INTERVAL_SECONDS: u64 = 24 * 60 * 60;

/// Validated settings ready for use by the core engine
#[derive(Debug, Clone)]
pub struct Settings {
    pub service: ServiceSettings,
    pub limits: Limits,
    pub fields: FieldLimits,
    pub presets: Vec<DurationPreset>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let presets = raw
            .presets
            .map(|p| p.into_iter().map(DurationPreset::from_raw).collect())
            .unwrap_or_else(default_presets);

        Self {
            service: ServiceSettings::from_raw(raw.service),
            limits: Limits::from_raw(&raw.limits),
            fields: FieldLimits::from_raw(&raw.limits),
            presets,
        }
    }

    /// Whether the user is listed as an admin in the service section
    pub fn is_admin(&self, user: &UserId) -> bool {
        self.service.admins.contains(user)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_raw(RawConfig {
            config_version: crate::CURRENT_CONFIG_VERSION,
            service: RawServiceConfig::default(),
            limits: RawLimits::default(),
            presets: None,
        })
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub data_dir: PathBuf,
    pub admins: HashSet<UserId>,
}

impl ServiceSettings {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            admins: raw
                .admins
                .into_iter()
                .map(|a| UserId::new(a.trim()))
                .collect(),
        }
    }
}

/// Booking, queue and scheduler limits
#[derive(Debug, Clone)]
pub struct Limits {
    /// Cap on a booking's total length (start to expiry)
    pub max_booking: Duration,
    /// Near-expiry warning window
    pub notify_before: Duration,
    /// Scheduler tick interval
    pub check_interval: std::time::Duration,
    /// Desired duration recorded when a queue join omits one
    pub default_queue_duration: Duration,
    pub max_queue_size: usize,
    pub max_resources: usize,
    pub max_history: usize,
}

impl Limits {
    fn from_raw(raw: &RawLimits) -> Self {
        let hours = raw.max_booking_hours.unwrap_or(DEFAULT_MAX_BOOKING_HOURS);
        let notify = raw
            .notify_before_minutes
            .unwrap_or(DEFAULT_NOTIFY_BEFORE_MINUTES);
        let interval = raw
            .check_interval_seconds
            .unwrap_or(DEFAULT_CHECK_INTERVAL_SECONDS);
        let queue_minutes = raw.default_queue_minutes.unwrap_or(DEFAULT_QUEUE_MINUTES);

        // Validation rejects values past these bounds; clamp for raw input
        // that skipped it
        Self {
            max_booking: Duration::hours(hours.min(MAX_BOOKING_HOURS_LIMIT) as i64),
            notify_before: Duration::minutes(notify.min(MAX_WINDOW_MINUTES) as i64),
            check_interval: std::time::Duration::from_secs(
                interval.min(MAX_CHECK_INTERVAL_SECONDS),
            ),
            default_queue_duration: Duration::minutes(queue_minutes.min(MAX_WINDOW_MINUTES) as i64),
            max_queue_size: raw.max_queue_size.unwrap_or(DEFAULT_MAX_QUEUE_SIZE) as usize,
            max_resources: raw.max_resources.unwrap_or(DEFAULT_MAX_RESOURCES) as usize,
            max_history: raw.max_history.unwrap_or(DEFAULT_MAX_HISTORY) as usize,
        }
    }

    pub fn max_booking_minutes(&self) -> i64 {
        self.max_booking.num_minutes()
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from_raw(&RawLimits::default())
    }
}

/// Length caps for user-supplied text
#[derive(Debug, Clone)]
pub struct FieldLimits {
    pub name: usize,
    pub location: usize,
    pub icon: usize,
    pub description: usize,
    /// Purposes are truncated to this length rather than rejected
    pub purpose: usize,
    pub metadata_entries: usize,
    pub metadata_key: usize,
    pub metadata_value: usize,
}

impl FieldLimits {
    fn from_raw(raw: &RawLimits) -> Self {
        let get = |v: Option<u64>, default: usize| v.map(|n| n as usize).unwrap_or(default);
        Self {
            name: get(raw.max_name_len, 64),
            location: get(raw.max_location_len, 64),
            icon: get(raw.max_icon_len, 10),
            description: get(raw.max_description_len, 500),
            purpose: get(raw.max_purpose_len, 200),
            metadata_entries: get(raw.max_metadata_entries, 32),
            metadata_key: get(raw.max_metadata_key_len, 64),
            metadata_value: get(raw.max_metadata_value_len, 256),
        }
    }
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self::from_raw(&RawLimits::default())
    }
}

/// A named booking duration shortcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationPreset {
    pub label: String,
    pub duration: Duration,
}

impl DurationPreset {
    fn from_raw(raw: RawPreset) -> Self {
        Self {
            label: raw.label.trim().to_string(),
            duration: Duration::minutes(raw.minutes.clamp(0, MAX_WINDOW_MINUTES as i64)),
        }
    }
}

fn default_presets() -> Vec<DurationPreset> {
    [
        ("30m", 30),
        ("1h", 60),
        ("2h", 120),
        ("4h", 240),
        ("8h", 480),
        ("Until end of day", 600),
    ]
    .into_iter()
    .map(|(label, minutes)| DurationPreset {
        label: label.to_string(),
        duration: Duration::minutes(minutes),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let settings = Settings::default();
        assert_eq!(settings.limits.max_booking, Duration::hours(24));
        assert_eq!(settings.limits.notify_before, Duration::minutes(10));
        assert_eq!(settings.limits.check_interval, std::time::Duration::from_secs(30));
        assert_eq!(settings.limits.default_queue_duration, Duration::minutes(60));
        assert_eq!(settings.limits.max_queue_size, 20);
        assert_eq!(settings.limits.max_resources, 100);
        assert_eq!(settings.limits.max_history, 50);
        assert_eq!(settings.fields.icon, 10);
        assert_eq!(settings.fields.purpose, 200);
        assert_eq!(settings.presets.len(), 6);
        assert!(settings.service.admins.is_empty());
    }

    #[test]
    fn overrides_applied() {
        let raw: RawConfig = toml::from_str(
            r#"
            config_version = 1
            [service]
            admins = [" alice "]
            [limits]
            max_booking_hours = 2
            max_name_len = 16
            [[presets]]
            label = "Quick"
            minutes = 15
            "#,
        )
        .unwrap();

        let settings = Settings::from_raw(raw);
        assert_eq!(settings.limits.max_booking_minutes(), 120);
        assert_eq!(settings.fields.name, 16);
        assert!(settings.is_admin(&UserId::new("alice")));
        assert_eq!(
            settings.presets,
            vec![DurationPreset {
                label: "Quick".into(),
                duration: Duration::minutes(15)
            }]
        );
    }

    #[test]
    fn unvalidated_huge_limits_are_clamped() {
        let raw: RawConfig = toml::from_str(
            r#"
            config_version = 1
            [limits]
            max_booking_hours = 9223372036854775807
            notify_before_minutes = 9223372036854775807
            default_queue_minutes = 9223372036854775807
            check_interval_seconds = 9223372036854775807
            [[presets]]
            label = "Forever"
            minutes = 9223372036854775807
            "#,
        )
        .unwrap();

        let settings = Settings::from_raw(raw);
        assert_eq!(
            settings.limits.max_booking,
            Duration::hours(MAX_BOOKING_HOURS_LIMIT as i64)
        );
        assert_eq!(
            settings.limits.check_interval,
            std::time::Duration::from_secs(MAX_CHECK_INTERVAL_SECONDS)
        );
        assert_eq!(
            settings.presets[0].duration,
            Duration::minutes(MAX_WINDOW_MINUTES as i64)
        );
    }
}
