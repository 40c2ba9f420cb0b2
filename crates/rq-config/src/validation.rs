//! Configuration validation

use crate::schema::{RawConfig, RawPreset};
use crate::settings::{
    DEFAULT_MAX_BOOKING_HOURS, MAX_BOOKING_HOURS_LIMIT, MAX_CHECK_INTERVAL_SECONDS,
    MAX_WINDOW_MINUTES,
};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("limits.{key} must be at most {max}, got {value}")]
    LimitTooLarge {
        key: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Warning window {notify_minutes}m >= max booking length {max_minutes}m")]
    WarningExceedsMaxBooking { notify_minutes: u64, max_minutes: u64 },

    #[error("Preset '{label}': {message}")]
    InvalidPreset { label: String, message: String },

    #[error("Duplicate preset label: {0}")]
    DuplicatePreset(String),

    #[error("Service config error: {0}")]
    ServiceError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (key, value) in config.limits.entries() {
        if value == Some(0) {
            errors.push(ValidationError::ZeroLimit(key));
        }
    }

    let limits = &config.limits;
    let time_bounds = [
        ("max_booking_hours", limits.max_booking_hours, MAX_BOOKING_HOURS_LIMIT),
        ("notify_before_minutes", limits.notify_before_minutes, MAX_WINDOW_MINUTES),
        ("default_queue_minutes", limits.default_queue_minutes, MAX_WINDOW_MINUTES),
        ("check_interval_seconds", limits.check_interval_seconds, MAX_CHECK_INTERVAL_SECONDS),
    ];
    for (key, value, max) in time_bounds {
        if let Some(value) = value
            && value > max
        {
            errors.push(ValidationError::LimitTooLarge { key, value, max });
        }
    }

    let max_minutes = limits
        .max_booking_hours
        .unwrap_or(DEFAULT_MAX_BOOKING_HOURS)
        .saturating_mul(60);

    // A warning window covering the whole booking would fire immediately
    if let Some(notify) = config.limits.notify_before_minutes
        && max_minutes > 0
        && notify >= max_minutes
    {
        errors.push(ValidationError::WarningExceedsMaxBooking {
            notify_minutes: notify,
            max_minutes,
        });
    }

    if let Some(presets) = &config.presets {
        let mut seen = HashSet::new();
        for preset in presets {
            if !seen.insert(preset.label.trim().to_lowercase()) {
                errors.push(ValidationError::DuplicatePreset(preset.label.clone()));
            }
            errors.extend(validate_preset(preset, max_minutes));
        }
    }

    for admin in &config.service.admins {
        if admin.trim().is_empty() {
            errors.push(ValidationError::ServiceError(
                "admin user id cannot be empty".into(),
            ));
        }
    }

    errors
}

fn validate_preset(preset: &RawPreset, max_minutes: u64) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if preset.label.trim().is_empty() {
        errors.push(ValidationError::InvalidPreset {
            label: preset.label.clone(),
            message: "label cannot be empty".into(),
        });
    }

    if preset.minutes <= 0 {
        errors.push(ValidationError::InvalidPreset {
            label: preset.label.clone(),
            message: format!("minutes must be positive, got {}", preset.minutes),
        });
    } else if max_minutes > 0 && preset.minutes as u64 > max_minutes {
        errors.push(ValidationError::InvalidPreset {
            label: preset.label.clone(),
            message: format!(
                "{} minutes exceeds the max booking length of {} minutes",
                preset.minutes, max_minutes
            ),
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> RawConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let config = parse("config_version = 1");
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn zero_limits_rejected() {
        let config = parse(
            r#"
            config_version = 1
            [limits]
            max_queue_size = 0
            check_interval_seconds = 0
            "#,
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ZeroLimit("max_queue_size"))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ZeroLimit("check_interval_seconds"))));
    }

    #[test]
    fn warning_window_must_be_shorter_than_max_booking() {
        let config = parse(
            r#"
            config_version = 1
            [limits]
            max_booking_hours = 1
            notify_before_minutes = 60
            "#,
        );

        let errors = validate_config(&config);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::WarningExceedsMaxBooking {
                notify_minutes: 60,
                max_minutes: 60
            }]
        ));
    }

    #[test]
    fn oversized_time_limits_rejected() {
        let config = parse(
            r#"
            config_version = 1
            [limits]
            max_booking_hours = 9223372036854775807
            notify_before_minutes = 9999999999999
            default_queue_minutes = 9999999999999
            check_interval_seconds = 9223372036854775807
            "#,
        );

        let errors = validate_config(&config);
        let too_large: Vec<&str> = errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::LimitTooLarge { key, .. } => Some(*key),
                _ => None,
            })
            .collect();
        assert_eq!(
            too_large,
            vec![
                "max_booking_hours",
                "notify_before_minutes",
                "default_queue_minutes",
                "check_interval_seconds"
            ]
        );
    }

    #[test]
    fn presets_checked_against_max_booking() {
        let config = parse(
            r#"
            config_version = 1
            [limits]
            max_booking_hours = 2

            [[presets]]
            label = "1h"
            minutes = 60

            [[presets]]
            label = "All day"
            minutes = 480

            [[presets]]
            label = "Never"
            minutes = 0
            "#,
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::InvalidPreset { .. })));
    }

    #[test]
    fn duplicate_preset_labels_rejected() {
        let config = parse(
            r#"
            config_version = 1

            [[presets]]
            label = "1h"
            minutes = 60

            [[presets]]
            label = "1H"
            minutes = 61
            "#,
        );

        let errors = validate_config(&config);
        assert!(matches!(errors.as_slice(), [ValidationError::DuplicatePreset(_)]));
    }

    #[test]
    fn blank_admin_rejected() {
        let config = parse(
            r#"
            config_version = 1
            [service]
            admins = ["alice", "  "]
            "#,
        );

        let errors = validate_config(&config);
        assert!(matches!(errors.as_slice(), [ValidationError::ServiceError(_)]));
    }
}
