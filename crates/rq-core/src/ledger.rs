//! Booking ledger: book, extend, release and the shared close-out

use chrono::{DateTime, Duration, Utc};
use rq_store::{JsonRecords, KvStore, booking_key};
use rq_util::{ResourceId, Result, RqError, UserId};
use tracing::{debug, info};

use crate::directory::clean_purpose;
use crate::messages::{self, Outbox};
use crate::{Booking, CoreEngine, HistoryEntry, QueueEntry};

/// Why a booking is being closed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Released,
    Expired,
}

/// Result of a close-out
#[derive(Debug, Clone)]
pub struct CloseOut {
    pub history: HistoryEntry,
    /// The waiter popped from the front of the queue, if any
    pub handed_off: Option<QueueEntry>,
}

impl CoreEngine {
    /// The booking on `id` if it has not yet expired
    pub fn current_booking(&self, id: &ResourceId, now: DateTime<Utc>) -> Result<Option<Booking>> {
        Ok(self
            .current_booking_raw(id)?
            .filter(|b| b.is_effective(now)))
    }

    /// The stored booking on `id`, expired or not
    pub fn current_booking_raw(&self, id: &ResourceId) -> Result<Option<Booking>> {
        Ok(self.store.get_json(&booking_key(id))?)
    }

    /// Book a resource for `minutes` starting at `now`
    pub fn book(
        &self,
        id: &ResourceId,
        user: &UserId,
        minutes: i64,
        purpose: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let settings = self.settings();
        let max_minutes = settings.limits.max_booking_minutes();
        if minutes <= 0 {
            return Err(RqError::InvalidDuration(format!(
                "{} minutes is not a positive duration",
                minutes
            )));
        }
        if minutes > max_minutes {
            return Err(RqError::InvalidDuration(format!(
                "{} minutes exceeds the maximum of {} minutes",
                minutes, max_minutes
            )));
        }
        let purpose = clean_purpose(purpose, settings.fields.purpose);

        let mut outbox = Outbox::new();
        let result = self.locks.with_resource(id, || -> Result<Booking> {
            let resource = self.get_resource(id)?;
            let stale = match self.current_booking_raw(id)? {
                Some(existing) if existing.is_effective(now) => {
                    return Err(RqError::AlreadyBooked(id.clone()));
                }
                other => other,
            };

            // An expired booking the scheduler has not reached yet still
            // becomes history before it is overwritten
            if let Some(stale) = stale {
                debug!(resource_id = %id, user_id = %stale.user_id, "Recording unreconciled expired booking");
                self.push_history(HistoryEntry {
                    resource_id: id.clone(),
                    user_id: stale.user_id,
                    purpose: stale.purpose,
                    start: stale.start,
                    end: stale.expiry,
                })?;
            }

            let booking = Booking {
                resource_id: id.clone(),
                user_id: user.clone(),
                purpose,
                start: now,
                expiry: now + Duration::minutes(minutes),
                notified_near_expiry: false,
                notified_queue_joined: false,
            };
            self.store.put_json(&booking_key(id), &booking)?;

            if self.remove_from_queue(id, user)? {
                debug!(resource_id = %id, user_id = %user, "Booker removed from queue");
            }

            let watchers: Vec<UserId> = self
                .load_subscribers(id)?
                .into_iter()
                .filter(|u| u != user)
                .collect();
            outbox.to_many(
                watchers,
                messages::booked(
                    &resource.name,
                    &self.display_name(user),
                    booking.length(),
                    &booking.expiry,
                ),
            );

            info!(
                resource_id = %id,
                user_id = %user,
                minutes,
                expiry = %booking.expiry,
                "Resource booked"
            );
            Ok(booking)
        });

        self.deliver(outbox);
        result
    }

    /// Push the expiry of the caller's booking forward by `extra_minutes`
    pub fn extend(
        &self,
        id: &ResourceId,
        user: &UserId,
        extra_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        if extra_minutes <= 0 {
            return Err(RqError::InvalidDuration(format!(
                "{} minutes is not a positive duration",
                extra_minutes
            )));
        }
        let max = self.settings().limits.max_booking;

        self.locks.with_resource(id, || {
            let mut booking = self
                .current_booking(id, now)?
                .ok_or_else(|| RqError::NotBooked(id.clone()))?;
            if &booking.user_id != user {
                return Err(RqError::NotHolder(user.clone()));
            }

            let exceeded = || RqError::DurationExceeded {
                max_minutes: max.num_minutes(),
            };
            let new_expiry = Duration::try_minutes(extra_minutes)
                .and_then(|extra| booking.expiry.checked_add_signed(extra))
                .ok_or_else(exceeded)?;
            if new_expiry - booking.start > max {
                return Err(exceeded());
            }

            booking.expiry = new_expiry;
            booking.notified_near_expiry = false;
            self.store.put_json(&booking_key(id), &booking)?;

            info!(
                resource_id = %id,
                user_id = %user,
                extra_minutes,
                expiry = %booking.expiry,
                "Booking extended"
            );
            Ok(booking)
        })
    }

    /// Release a booking early. The holder or an admin may do this.
    pub fn release(
        &self,
        id: &ResourceId,
        user: &UserId,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<CloseOut> {
        let mut outbox = Outbox::new();
        let result = self.locks.with_resource(id, || -> Result<CloseOut> {
            let booking = self
                .current_booking(id, now)?
                .ok_or_else(|| RqError::NotBooked(id.clone()))?;
            if &booking.user_id != user && !is_admin {
                return Err(RqError::forbidden(
                    "only the holder or an admin can release this booking",
                ));
            }

            let name = self.resource_name(id);
            let closed = self.close_out(&booking, now, CloseReason::Released, &name, &mut outbox)?;
            info!(
                resource_id = %id,
                user_id = %booking.user_id,
                released_by = %user,
                "Booking released"
            );
            Ok(closed)
        });

        self.deliver(outbox);
        result
    }

    /// End a booking: record history, delete it, queue the notifications
    /// and hand the resource to the next waiter.
    ///
    /// Caller must hold the resource lock.
    pub(crate) fn close_out(
        &self,
        booking: &Booking,
        end: DateTime<Utc>,
        reason: CloseReason,
        name: &str,
        outbox: &mut Outbox,
    ) -> Result<CloseOut> {
        let id = &booking.resource_id;
        let history = HistoryEntry {
            resource_id: id.clone(),
            user_id: booking.user_id.clone(),
            purpose: booking.purpose.clone(),
            start: booking.start,
            end: end.max(booking.start),
        };
        self.push_history(history.clone())?;
        self.store.delete(&booking_key(id))?;

        let subscribers = self.load_subscribers(id)?;
        match reason {
            CloseReason::Released => {
                outbox.to_many(subscribers, messages::released(name));
            }
            CloseReason::Expired => {
                outbox.to(&booking.user_id, messages::expired_for_holder(name));
                outbox.to_many(subscribers, messages::expired_for_subscribers(name));
            }
        }

        let handed_off = self.hand_off(id)?;
        if let Some(next) = &handed_off {
            outbox.to(
                &next.user_id,
                messages::handed_off(name, id, next.desired_duration()),
            );
            info!(resource_id = %id, user_id = %next.user_id, "Queue handed off");
        }

        Ok(CloseOut {
            history,
            handed_off,
        })
    }

    /// Resource name for messages, falling back to the id
    pub(crate) fn resource_name(&self, id: &ResourceId) -> String {
        match self.get_resource(id) {
            Ok(resource) => resource.name,
            Err(_) => id.to_string(),
        }
    }
}
