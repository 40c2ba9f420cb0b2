//! Events emitted by a scheduler sweep

use chrono::Duration;
use rq_util::{ResourceId, UserId};

/// Events emitted by the core engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A booking ran past its expiry and was closed out
    BookingExpired {
        resource_id: ResourceId,
        user_id: UserId,
        handed_off_to: Option<UserId>,
    },

    /// The holder was warned that the booking is about to end
    ExpiryWarning {
        resource_id: ResourceId,
        user_id: UserId,
        remaining: Duration,
    },

    /// A resource could not be processed this sweep and will be retried
    ResourceSkipped {
        resource_id: ResourceId,
        error: String,
    },
}
