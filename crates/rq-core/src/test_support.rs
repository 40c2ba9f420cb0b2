//! Shared fixtures for unit tests

use chrono::{DateTime, TimeZone, Utc};
use rq_config::{Settings, SettingsHandle};
use rq_host_api::MockHost;
use rq_store::MemoryStore;
use rq_util::UserId;
use std::sync::Arc;

use crate::{CoreEngine, Resource, ResourceDraft};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

pub fn admin() -> UserId {
    UserId::new("admin")
}

pub fn u1() -> UserId {
    UserId::new("u1")
}

pub fn u2() -> UserId {
    UserId::new("u2")
}

pub fn u3() -> UserId {
    UserId::new("u3")
}

pub fn engine() -> (Arc<CoreEngine>, Arc<MemoryStore>, Arc<MockHost>) {
    engine_with(|_| {})
}

pub fn engine_with(
    tweak: impl FnOnce(&mut Settings),
) -> (Arc<CoreEngine>, Arc<MemoryStore>, Arc<MockHost>) {
    engine_with_host(MockHost::new().with_admin("admin"), tweak)
}

pub fn engine_with_host(
    host: MockHost,
    tweak: impl FnOnce(&mut Settings),
) -> (Arc<CoreEngine>, Arc<MemoryStore>, Arc<MockHost>) {
    let mut settings = Settings::default();
    tweak(&mut settings);

    let store = Arc::new(MemoryStore::new());
    let host = Arc::new(host);
    let engine = CoreEngine::new(
        store.clone(),
        host.clone(),
        host.clone(),
        SettingsHandle::new(settings),
    );
    (Arc::new(engine), store, host)
}

pub fn create(engine: &CoreEngine, name: &str) -> Resource {
    engine
        .create_resource(&admin(), ResourceDraft::named(name), t0())
        .unwrap()
}
