//! Users watching a resource for status changes

use rq_store::{JsonRecords, subscribers_key};
use rq_util::{ResourceId, Result, RqError, UserId};
use tracing::{debug, info};

use crate::CoreEngine;

impl CoreEngine {
    /// Subscribe to booking and release notifications for a resource
    pub fn subscribe(&self, id: &ResourceId, user: &UserId) -> Result<()> {
        self.locks.with_resource(id, || {
            self.get_resource(id)?;
            let mut subscribers = self.load_subscribers(id)?;
            if subscribers.contains(user) {
                return Err(RqError::AlreadySubscribed(user.clone()));
            }
            subscribers.push(user.clone());
            self.store.put_json(&subscribers_key(id), &subscribers)?;
            info!(resource_id = %id, user_id = %user, "Subscribed");
            Ok(())
        })
    }

    /// Unsubscribe. Returns whether the user was subscribed; absence is
    /// not an error.
    pub fn unsubscribe(&self, id: &ResourceId, user: &UserId) -> Result<bool> {
        self.locks.with_resource(id, || {
            let mut subscribers = self.load_subscribers(id)?;
            let before = subscribers.len();
            subscribers.retain(|u| u != user);
            if subscribers.len() == before {
                debug!(resource_id = %id, user_id = %user, "Unsubscribe for user not subscribed");
                return Ok(false);
            }
            self.store.put_json(&subscribers_key(id), &subscribers)?;
            info!(resource_id = %id, user_id = %user, "Unsubscribed");
            Ok(true)
        })
    }

    pub fn subscribers(&self, id: &ResourceId) -> Result<Vec<UserId>> {
        self.load_subscribers(id)
    }

    pub fn is_subscribed(&self, id: &ResourceId, user: &UserId) -> Result<bool> {
        Ok(self.load_subscribers(id)?.contains(user))
    }

    pub(crate) fn load_subscribers(&self, id: &ResourceId) -> Result<Vec<UserId>> {
        Ok(self.store.get_json(&subscribers_key(id))?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn subscribe_twice_is_an_error() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");

        engine.subscribe(&r.id, &u1()).unwrap();
        assert!(matches!(
            engine.subscribe(&r.id, &u1()),
            Err(RqError::AlreadySubscribed(_))
        ));
        assert_eq!(engine.subscribers(&r.id).unwrap(), vec![u1()]);
    }

    #[test]
    fn unsubscribe_is_silent_on_absence() {
        let (engine, _store, _host) = engine();
        let r = create(&engine, "gpu");
        engine.subscribe(&r.id, &u1()).unwrap();

        assert!(!engine.unsubscribe(&r.id, &u2()).unwrap());
        assert!(engine.unsubscribe(&r.id, &u1()).unwrap());
        assert!(!engine.unsubscribe(&r.id, &u1()).unwrap());
        assert!(!engine.is_subscribed(&r.id, &u1()).unwrap());
    }

    #[test]
    fn subscribe_requires_resource() {
        let (engine, _store, _host) = engine();
        assert!(matches!(
            engine.subscribe(&ResourceId::new("deadbeef"), &u1()),
            Err(RqError::NotFound(_))
        ));
    }
}
