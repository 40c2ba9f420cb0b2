//! Time utilities for rq
//!
//! All persisted timestamps are UTC wall-clock instants. Durations in the
//! booking domain are `chrono::Duration` so they compose with timestamps.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `RQ_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising expiry and near-expiry warnings without waiting.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` in local time (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "RQ_MOCK_TIME";

/// Offset between mock time and real time, computed once at first use.
static MOCK_TIME_OFFSET: OnceLock<Option<Duration>> = OnceLock::new();

fn get_mock_time_offset() -> Option<Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => {
                        if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                            let offset = mock_dt.with_timezone(&Utc).signed_duration_since(Utc::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Current wall-clock time, respecting mock time settings in debug builds.
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();
    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Format an instant as local `HH:MM`
pub fn format_clock_time(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%H:%M").to_string()
}

/// Format a duration compactly: `45m`, `2h`, `2h30m`
pub fn format_duration(d: Duration) -> String {
    let total_minutes = d.num_minutes();
    if total_minutes < 60 {
        return format!("{}m", total_minutes);
    }
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if minutes == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h{}m", hours, minutes)
    }
}

/// Format the time left until a deadline: `45 sec`, `12 min`, `1 h 5 min`
pub fn format_time_left(d: Duration) -> String {
    if d < Duration::zero() {
        return "expired".into();
    }
    if d < Duration::minutes(1) {
        return format!("{} sec", d.num_seconds());
    }
    if d < Duration::hours(1) {
        return format!("{} min", d.num_minutes());
    }
    let hours = d.num_hours();
    let minutes = d.num_minutes() % 60;
    if minutes == 0 {
        format!("{} h", hours)
    } else {
        format!("{} h {} min", hours, minutes)
    }
}

/// Parse a user-supplied duration.
///
/// Accepts a bare number of minutes (`90`) or unit groups (`30m`, `1h`,
/// `2h30m`, `45s`). The result must be strictly positive.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return Err("empty duration".into());
    }

    if let Ok(minutes) = s.parse::<i64>() {
        if minutes <= 0 {
            return Err("duration must be positive".into());
        }
        return Duration::try_minutes(minutes).ok_or_else(|| too_long(input));
    }

    let mut total = Duration::zero();
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(format!("invalid duration '{}' (examples: 30m, 1h, 2h30m)", input));
        }
        let value: i64 = digits
            .parse()
            .map_err(|_| format!("invalid number in '{}'", input))?;
        digits.clear();
        let part = match c {
            'h' => Duration::try_hours(value),
            'm' => Duration::try_minutes(value),
            's' => Duration::try_seconds(value),
            other => return Err(format!("unknown unit '{}' in '{}'", other, input)),
        };
        total = part
            .and_then(|p| total.checked_add(&p))
            .ok_or_else(|| too_long(input))?;
    }
    if !digits.is_empty() {
        return Err(format!("missing unit after '{}' in '{}'", digits, input));
    }
    if total <= Duration::zero() {
        return Err("duration must be positive".into());
    }
    Ok(total)
}

fn too_long(input: &str) -> String {
    format!("duration '{}' is too long", input)
}
