//! Records persisted by the engine and views handed back to callers

use chrono::{DateTime, Duration, Utc};
use rq_util::{ResourceId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bookable resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    /// Free-form location tag, such as a host name or address
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
}

/// Fields supplied when creating a resource
#[derive(Debug, Clone, Default)]
pub struct ResourceDraft {
    pub name: String,
    pub location: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ResourceDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update. `None` leaves a field alone; an empty string clears an
/// optional field.
#[derive(Debug, Clone, Default)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
}

/// The current hold on a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub resource_id: ResourceId,
    pub user_id: UserId,
    #[serde(default)]
    pub purpose: Option<String>,
    pub start: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    #[serde(default)]
    pub notified_near_expiry: bool,
    #[serde(default)]
    pub notified_queue_joined: bool,
}

impl Booking {
    /// Whether the booking still holds the resource at `now`
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expiry - now
    }

    /// Total length from start to expiry
    pub fn length(&self) -> Duration {
        self.expiry - self.start
    }
}

/// A user waiting for a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub resource_id: ResourceId,
    pub user_id: UserId,
    pub desired_minutes: i64,
    #[serde(default)]
    pub purpose: Option<String>,
    pub queued_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Saturates instead of overflowing on records written with huge values
    pub fn desired_duration(&self) -> Duration {
        Duration::try_minutes(self.desired_minutes.max(0)).unwrap_or(Duration::MAX)
    }
}

/// A completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub resource_id: ResourceId,
    pub user_id: UserId,
    #[serde(default)]
    pub purpose: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Effective booking as shown to a viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingView {
    pub holder: UserId,
    pub holder_name: String,
    pub purpose: Option<String>,
    pub start: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub remaining: Duration,
}

/// Queue entry as shown to a viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueView {
    /// 1-based
    pub position: usize,
    pub user_id: UserId,
    pub display_name: String,
    pub desired: Duration,
    pub purpose: Option<String>,
}

/// Everything a viewer needs to render one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    pub resource: Resource,
    pub booking: Option<BookingView>,
    pub queue: Vec<QueueView>,
    pub subscriber_count: usize,
    pub is_holder: bool,
    pub in_queue: bool,
    pub is_subscribed: bool,
}

impl ResourceStatus {
    pub fn is_free(&self) -> bool {
        self.booking.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn booking_is_masked_at_expiry() {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let booking = Booking {
            resource_id: ResourceId::new("abcd1234"),
            user_id: UserId::new("u1"),
            purpose: None,
            start,
            expiry: start + Duration::minutes(30),
            notified_near_expiry: false,
            notified_queue_joined: false,
        };

        assert!(booking.is_effective(start + Duration::minutes(29)));
        assert!(!booking.is_effective(start + Duration::minutes(30)));
        assert_eq!(booking.length(), Duration::minutes(30));
    }

    #[test]
    fn records_tolerate_missing_optional_fields() {
        let json = r#"{
            "resource_id": "abcd1234",
            "user_id": "u1",
            "start": "2025-03-03T09:00:00Z",
            "expiry": "2025-03-03T10:00:00Z"
        }"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert!(booking.purpose.is_none());
        assert!(!booking.notified_near_expiry);
        assert!(!booking.notified_queue_joined);
    }

    #[test]
    fn stored_desired_minutes_never_overflow() {
        let entry = QueueEntry {
            resource_id: ResourceId::new("abcd1234"),
            user_id: UserId::new("u2"),
            desired_minutes: i64::MAX,
            purpose: None,
            queued_at: Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap(),
        };
        assert_eq!(entry.desired_duration(), Duration::MAX);
        assert_eq!(
            QueueEntry { desired_minutes: -3, ..entry }.desired_duration(),
            Duration::zero()
        );
    }
}
