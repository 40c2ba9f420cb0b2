//! Combined per-resource views for display

use chrono::{DateTime, Utc};
use rq_util::{ResourceId, Result, UserId};

use crate::{BookingView, CoreEngine, QueueView, Resource, ResourceStatus};

impl CoreEngine {
    /// Status of one resource as seen by `viewer`
    pub fn status(
        &self,
        id: &ResourceId,
        viewer: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ResourceStatus> {
        let resource = self.get_resource(id)?;
        self.build_status(resource, viewer, now)
    }

    /// Status of every resource in directory order
    pub fn status_all(&self, viewer: &UserId, now: DateTime<Utc>) -> Result<Vec<ResourceStatus>> {
        self.list_resources()?
            .into_iter()
            .map(|resource| self.build_status(resource, viewer, now))
            .collect()
    }

    fn build_status(
        &self,
        resource: Resource,
        viewer: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ResourceStatus> {
        let id = &resource.id;
        let booking = self.current_booking(id, now)?.map(|b| BookingView {
            holder_name: self.display_name(&b.user_id),
            remaining: b.remaining(now),
            holder: b.user_id,
            purpose: b.purpose,
            start: b.start,
            expiry: b.expiry,
        });

        let queue: Vec<QueueView> = self
            .queue_entries(id)?
            .into_iter()
            .enumerate()
            .map(|(i, e)| QueueView {
                position: i + 1,
                display_name: self.display_name(&e.user_id),
                desired: e.desired_duration(),
                user_id: e.user_id,
                purpose: e.purpose,
            })
            .collect();

        let subscribers = self.load_subscribers(id)?;

        Ok(ResourceStatus {
            is_holder: booking.as_ref().is_some_and(|b| &b.holder == viewer),
            in_queue: queue.iter().any(|q| &q.user_id == viewer),
            is_subscribed: subscribers.contains(viewer),
            subscriber_count: subscribers.len(),
            booking,
            queue,
            resource,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use chrono::Duration;
    use rq_host_api::MockHost;

    #[test]
    fn status_combines_everything() {
        let host = MockHost::new()
            .with_admin("admin")
            .with_name("u1", "Ursula")
            .with_name("u2", "Victor");
        let (engine, _store, _host) = engine_with_host(host, |_| {});
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 60, Some("train"), t0()).unwrap();
        engine.join_queue(&r.id, &u2(), Some(30), None, t0()).unwrap();
        engine.subscribe(&r.id, &u2()).unwrap();
        engine.subscribe(&r.id, &u3()).unwrap();

        let now = t0() + Duration::minutes(15);
        let status = engine.status(&r.id, &u2(), now).unwrap();

        let booking = status.booking.as_ref().unwrap();
        assert_eq!(booking.holder_name, "Ursula");
        assert_eq!(booking.remaining, Duration::minutes(45));
        assert_eq!(status.queue.len(), 1);
        assert_eq!(status.queue[0].display_name, "Victor");
        assert_eq!(status.queue[0].position, 1);
        assert_eq!(status.subscriber_count, 2);
        assert!(!status.is_holder);
        assert!(status.in_queue);
        assert!(status.is_subscribed);

        let holder_view = engine.status(&r.id, &u1(), now).unwrap();
        assert!(holder_view.is_holder);
        assert!(!holder_view.in_queue);
    }

    #[test]
    fn status_all_shows_free_resources() {
        let (engine, _store, _host) = engine();
        let a = create(&engine, "a");
        create(&engine, "b");
        engine.book(&a.id, &u1(), 30, None, t0()).unwrap();

        let all = engine.status_all(&u1(), t0()).unwrap();
        assert_eq!(all.len(), 2);
        assert!(!all[0].is_free());
        assert!(all[1].is_free());

        // Expired bookings read as free
        let later = engine.status_all(&u1(), t0() + Duration::minutes(30)).unwrap();
        assert!(later.iter().all(|s| s.is_free()));
    }
}
