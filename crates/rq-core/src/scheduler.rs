//! Expiry scheduler
//!
//! One background task sweeps every resource on a fixed interval. A sweep
//! closes out bookings past their expiry (history, delete, notify, hand
//! off) and warns holders whose booking is inside the warning window. A
//! failure on one resource is logged and retried on the next sweep.

use chrono::{DateTime, Utc};
use rq_store::{JsonRecords, booking_key};
use rq_util::{ResourceId, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ledger::CloseReason;
use crate::messages::{self, Outbox};
use crate::{CoreEngine, CoreEvent};

impl CoreEngine {
    /// Run one pass over every resource
    pub fn sweep(&self, now: DateTime<Utc>) -> Vec<CoreEvent> {
        let ids = match self.resource_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Sweep could not read resource list");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        for id in ids {
            let mut outbox = Outbox::new();
            let result = self
                .locks
                .with_resource(&id, || self.sweep_resource(&id, now, &mut outbox));
            self.deliver(outbox);

            match result {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    warn!(resource_id = %id, error = %e, "Sweep skipped resource");
                    events.push(CoreEvent::ResourceSkipped {
                        resource_id: id,
                        error: e.to_string(),
                    });
                }
            }
        }

        debug!(events = events.len(), "Sweep finished");
        events
    }

    /// Caller must hold the resource lock.
    fn sweep_resource(
        &self,
        id: &ResourceId,
        now: DateTime<Utc>,
        outbox: &mut Outbox,
    ) -> Result<Option<CoreEvent>> {
        let Some(mut booking) = self.current_booking_raw(id)? else {
            return Ok(None);
        };
        let name = self.resource_name(id);

        if now >= booking.expiry {
            let closed = self.close_out(&booking, booking.expiry, CloseReason::Expired, &name, outbox)?;
            info!(
                resource_id = %id,
                user_id = %booking.user_id,
                expiry = %booking.expiry,
                "Booking expired"
            );
            return Ok(Some(CoreEvent::BookingExpired {
                resource_id: id.clone(),
                user_id: booking.user_id,
                handed_off_to: closed.handed_off.map(|e| e.user_id),
            }));
        }

        let remaining = booking.remaining(now);
        if remaining <= self.settings().limits.notify_before && !booking.notified_near_expiry {
            booking.notified_near_expiry = true;
            self.store.put_json(&booking_key(id), &booking)?;
            outbox.to(&booking.user_id, messages::near_expiry(&name, remaining));

            info!(
                resource_id = %id,
                user_id = %booking.user_id,
                remaining_secs = remaining.num_seconds(),
                "Expiry warning issued"
            );
            return Ok(Some(CoreEvent::ExpiryWarning {
                resource_id: id.clone(),
                user_id: booking.user_id,
                remaining,
            }));
        }

        Ok(None)
    }
}

/// Spawns the periodic sweep task
pub struct ExpiryScheduler;

impl ExpiryScheduler {
    /// Start sweeping. The first sweep runs immediately; the interval is
    /// re-read from settings before every wait.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: Arc<CoreEngine>) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!("Expiry scheduler started");
            loop {
                let sweep_engine = engine.clone();
                let now = rq_util::now();
                match tokio::task::spawn_blocking(move || sweep_engine.sweep(now)).await {
                    Ok(events) if !events.is_empty() => {
                        debug!(count = events.len(), "Sweep produced events");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Sweep task failed"),
                }

                let interval = engine.settings().limits.check_interval;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => break,
                }
            }
            info!("Expiry scheduler stopped");
        });

        SchedulerHandle { stop_tx, task }
    }
}

/// Handle to a running scheduler. Dropping it also stops the task once the
/// current sweep finishes.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Request a stop and wait for the in-flight sweep to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use chrono::Duration;
    use rq_store::KvStore;

    #[test]
    fn sweep_expires_and_hands_off() {
        let (engine, _store, host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 30, Some("demo"), t0()).unwrap();
        engine.join_queue(&r.id, &u2(), Some(60), None, t0()).unwrap();
        engine.subscribe(&r.id, &u3()).unwrap();
        host.clear();

        let events = engine.sweep(t0() + Duration::minutes(31));
        assert_eq!(
            events,
            vec![CoreEvent::BookingExpired {
                resource_id: r.id.clone(),
                user_id: u1(),
                handed_off_to: Some(u2()),
            }]
        );

        assert!(engine.current_booking_raw(&r.id).unwrap().is_none());
        assert!(engine.queue_entries(&r.id).unwrap().is_empty());

        let history = engine.history(&r.id, 0).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].end, t0() + Duration::minutes(30));

        let sent = host.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].to, u1());
        assert!(sent[0].text.contains("expired"));
        assert_eq!(sent[1].to, u3());
        assert_eq!(sent[2].to, u2());
    }

    #[test]
    fn warning_fires_once() {
        let (engine, _store, host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 60, None, t0()).unwrap();

        assert!(engine.sweep(t0() + Duration::minutes(40)).is_empty());

        let events = engine.sweep(t0() + Duration::minutes(52));
        assert!(matches!(
            events.as_slice(),
            [CoreEvent::ExpiryWarning { remaining, .. }] if *remaining == Duration::minutes(8)
        ));
        assert!(engine.sweep(t0() + Duration::minutes(55)).is_empty());

        let to_holder = host.sent_to(&u1());
        assert_eq!(to_holder.len(), 1);
        assert!(to_holder[0].contains("expires in 8 min"));
    }

    #[test]
    fn expiry_without_queue() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 30, None, t0()).unwrap();

        let events = engine.sweep(t0() + Duration::hours(2));
        assert!(matches!(
            events.as_slice(),
            [CoreEvent::BookingExpired { handed_off_to: None, .. }]
        ));
        assert!(engine.sweep(t0() + Duration::hours(3)).is_empty());
    }

    #[test]
    fn unreadable_booking_skips_only_that_resource() {
        let (engine, store, host) = engine();
        let broken = create(&engine, "broken");
        let healthy = create(&engine, "healthy");
        store
            .set(&booking_key(&broken.id), b"not json".to_vec())
            .unwrap();
        engine.book(&healthy.id, &u1(), 30, None, t0()).unwrap();

        let events = engine.sweep(t0() + Duration::minutes(31));
        match events.as_slice() {
            [
                CoreEvent::ResourceSkipped { resource_id: skipped, .. },
                CoreEvent::BookingExpired { resource_id: expired, user_id, handed_off_to: None },
            ] => {
                assert_eq!(skipped, &broken.id);
                assert_eq!(expired, &healthy.id);
                assert_eq!(user_id, &u1());
            }
            other => panic!("unexpected events {:?}", other),
        }

        assert!(engine.current_booking_raw(&healthy.id).unwrap().is_none());
        assert_eq!(engine.history(&healthy.id, 0).unwrap().len(), 1);
        assert!(host.sent_to(&u1()).iter().any(|m| m.contains("expired")));
    }

    #[test]
    fn unreadable_resource_list_retries_next_sweep() {
        let (engine, store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 30, None, t0()).unwrap();
        let later = t0() + Duration::minutes(45);

        store.set_failing(true);
        assert!(engine.sweep(later).is_empty());
        store.set_failing(false);

        let events = engine.sweep(later);
        assert!(matches!(events.as_slice(), [CoreEvent::BookingExpired { .. }]));
    }

    #[test]
    fn notifier_failure_does_not_block_close_out() {
        let (engine, _store, host) = engine();
        let r = create(&engine, "gpu");
        engine.book(&r.id, &u1(), 30, None, t0()).unwrap();

        *host.fail_notify.lock().unwrap() = true;
        let events = engine.sweep(t0() + Duration::minutes(45));
        assert_eq!(events.len(), 1);
        assert!(engine.current_booking_raw(&r.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn scheduler_sweeps_before_stop_returns() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        let past = rq_util::now() - Duration::hours(3);
        engine.book(&r.id, &u1(), 60, None, past).unwrap();

        let handle = ExpiryScheduler::spawn(engine.clone());
        assert!(handle.is_running());
        handle.stop().await;

        assert!(engine.current_booking_raw(&r.id).unwrap().is_none());
        assert_eq!(engine.history(&r.id, 0).unwrap().len(), 1);
    }
}
