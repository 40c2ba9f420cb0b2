//! Per-resource FIFO of waiting users

use chrono::{DateTime, Utc};
use rq_store::{JsonRecords, booking_key, queue_key};
use rq_util::{ResourceId, Result, RqError, UserId};
use tracing::{debug, info};

use crate::directory::clean_purpose;
use crate::messages::{self, Outbox};
use crate::{CoreEngine, QueueEntry};

impl CoreEngine {
    /// Waiting users in order
    pub fn queue_entries(&self, id: &ResourceId) -> Result<Vec<QueueEntry>> {
        Ok(self.store.get_json(&queue_key(id))?.unwrap_or_default())
    }

    /// Join the queue and return the 1-based position.
    ///
    /// `desired_minutes` of `None` (or not positive) falls back to the
    /// configured default, and is capped at the maximum booking length. The
    /// current holder hears about the first join of their booking.
    pub fn join_queue(
        &self,
        id: &ResourceId,
        user: &UserId,
        desired_minutes: Option<i64>,
        purpose: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let settings = self.settings();
        let desired_minutes = desired_minutes
            .filter(|m| *m > 0)
            .unwrap_or_else(|| settings.limits.default_queue_duration.num_minutes())
            .min(settings.limits.max_booking_minutes());
        let purpose = clean_purpose(purpose, settings.fields.purpose);

        let mut outbox = Outbox::new();
        let result = self.locks.with_resource(id, || -> Result<usize> {
            let resource = self.get_resource(id)?;
            let booking = self.current_booking(id, now)?;
            if let Some(b) = &booking
                && &b.user_id == user
            {
                return Err(RqError::AlreadyHolder(user.clone()));
            }

            let mut queue = self.queue_entries(id)?;
            if queue.iter().any(|e| &e.user_id == user) {
                return Err(RqError::AlreadyQueued(user.clone()));
            }
            if queue.len() >= settings.limits.max_queue_size {
                return Err(RqError::QueueFull(settings.limits.max_queue_size));
            }

            queue.push(QueueEntry {
                resource_id: id.clone(),
                user_id: user.clone(),
                desired_minutes,
                purpose,
                queued_at: now,
            });
            self.store.put_json(&queue_key(id), &queue)?;
            let position = queue.len();

            if let Some(mut booking) = booking
                && !booking.notified_queue_joined
            {
                booking.notified_queue_joined = true;
                self.store.put_json(&booking_key(id), &booking)?;
                outbox.to(
                    &booking.user_id,
                    messages::queue_joined(&resource.name, &self.display_name(user)),
                );
            }

            info!(resource_id = %id, user_id = %user, position, "Joined queue");
            Ok(position)
        });

        self.deliver(outbox);
        result
    }

    /// Leave the queue. Returns whether the user was queued; absence is
    /// not an error.
    pub fn leave_queue(&self, id: &ResourceId, user: &UserId) -> Result<bool> {
        self.locks.with_resource(id, || {
            let removed = self.remove_from_queue(id, user)?;
            if removed {
                info!(resource_id = %id, user_id = %user, "Left queue");
            } else {
                debug!(resource_id = %id, user_id = %user, "Leave for user not in queue");
            }
            Ok(removed)
        })
    }

    /// Caller must hold the resource lock.
    pub(crate) fn remove_from_queue(&self, id: &ResourceId, user: &UserId) -> Result<bool> {
        let mut queue = self.queue_entries(id)?;
        let before = queue.len();
        queue.retain(|e| &e.user_id != user);
        if queue.len() == before {
            return Ok(false);
        }
        self.store.put_json(&queue_key(id), &queue)?;
        Ok(true)
    }

    /// Pop the front waiter. An empty queue yields `None`.
    ///
    /// Caller must hold the resource lock.
    pub(crate) fn hand_off(&self, id: &ResourceId) -> Result<Option<QueueEntry>> {
        let mut queue = self.queue_entries(id)?;
        if queue.is_empty() {
            return Ok(None);
        }
        let next = queue.remove(0);
        self.store.put_json(&queue_key(id), &queue)?;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use chrono::Duration;

    #[test]
    fn join_returns_positions_in_order() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");

        assert_eq!(engine.join_queue(&r.id, &u1(), Some(30), None, t0()).unwrap(), 1);
        assert_eq!(engine.join_queue(&r.id, &u2(), None, Some(" eval "), t0()).unwrap(), 2);

        let queue = engine.queue_entries(&r.id).unwrap();
        assert_eq!(queue[0].user_id, u1());
        assert_eq!(queue[1].desired_minutes, 60);
        assert_eq!(queue[1].purpose.as_deref(), Some("eval"));
    }

    #[test]
    fn non_positive_desired_uses_default() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.join_queue(&r.id, &u1(), Some(-5), None, t0()).unwrap();
        assert_eq!(
            engine.queue_entries(&r.id).unwrap()[0].desired_duration(),
            Duration::minutes(60)
        );
    }

    #[test]
    fn huge_desired_is_capped_at_max_booking() {
        let (engine, _store, host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 30, None, t0()).unwrap();
        engine.join_queue(&r.id, &u2(), Some(i64::MAX / 2), None, t0()).unwrap();

        let max = engine.settings().limits.max_booking;
        assert_eq!(engine.queue_entries(&r.id).unwrap()[0].desired_duration(), max);

        let status = engine.status(&r.id, &u1(), t0()).unwrap();
        assert_eq!(status.queue[0].desired, max);

        let closed = engine.release(&r.id, &u1(), false, t0()).unwrap();
        assert_eq!(closed.handed_off.map(|e| e.user_id), Some(u2()));
        assert!(host.sent_to(&u2()).iter().any(|m| m.contains("/rq book")));
    }

    #[test]
    fn double_join_rejected() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.join_queue(&r.id, &u1(), Some(30), None, t0()).unwrap();

        let err = engine.join_queue(&r.id, &u1(), Some(30), None, t0()).unwrap_err();
        assert!(matches!(err, RqError::AlreadyQueued(_)));
        assert_eq!(engine.queue_entries(&r.id).unwrap().len(), 1);
    }

    #[test]
    fn holder_cannot_queue() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 30, None, t0()).unwrap();

        let err = engine.join_queue(&r.id, &u1(), Some(30), None, t0()).unwrap_err();
        assert!(matches!(err, RqError::AlreadyHolder(_)));
    }

    #[test]
    fn queue_capacity() {
        let (engine, _store, _host) = engine_with(|s| s.limits.max_queue_size = 2);
        let r = create(&engine, "gpu");
        engine.join_queue(&r.id, &u1(), None, None, t0()).unwrap();
        engine.join_queue(&r.id, &u2(), None, None, t0()).unwrap();

        let err = engine.join_queue(&r.id, &u3(), None, None, t0()).unwrap_err();
        assert!(matches!(err, RqError::QueueFull(2)));
    }

    #[test]
    fn holder_notified_once() {
        let (engine, _store, host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 60, None, t0()).unwrap();

        engine.join_queue(&r.id, &u2(), None, None, t0()).unwrap();
        engine.join_queue(&r.id, &u3(), None, None, t0()).unwrap();

        let to_holder = host.sent_to(&u1());
        assert_eq!(to_holder, vec!["u2 joined the queue for gpu"]);
        assert!(engine.current_booking(&r.id, t0()).unwrap().unwrap().notified_queue_joined);
    }

    #[test]
    fn leave_is_idempotent() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.join_queue(&r.id, &u1(), None, None, t0()).unwrap();

        assert!(!engine.leave_queue(&r.id, &u2()).unwrap());
        assert_eq!(engine.queue_entries(&r.id).unwrap().len(), 1);

        assert!(engine.leave_queue(&r.id, &u1()).unwrap());
        assert!(!engine.leave_queue(&r.id, &u1()).unwrap());
        assert!(engine.queue_entries(&r.id).unwrap().is_empty());
    }

    #[test]
    fn hand_off_pops_front_and_tolerates_empty() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.join_queue(&r.id, &u1(), None, None, t0()).unwrap();
        engine.join_queue(&r.id, &u2(), None, None, t0()).unwrap();

        let first = engine.hand_off(&r.id).unwrap().unwrap();
        assert_eq!(first.user_id, u1());
        assert_eq!(engine.queue_entries(&r.id).unwrap()[0].user_id, u2());

        engine.hand_off(&r.id).unwrap();
        assert!(engine.hand_off(&r.id).unwrap().is_none());
    }
}
