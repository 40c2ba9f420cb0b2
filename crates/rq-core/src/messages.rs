//! Notification texts and the outbox they are collected in
//!
//! Messages are built while a resource lock is held and delivered only
//! after it has been released.

use chrono::{DateTime, Duration, Utc};
use rq_util::{ResourceId, UserId, format_clock_time, format_duration, format_time_left};

/// Messages waiting to be delivered
#[derive(Debug, Default)]
pub struct Outbox {
    items: Vec<(Vec<UserId>, String)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(&mut self, user: &UserId, text: String) {
        self.items.push((vec![user.clone()], text));
    }

    pub fn to_many(&mut self, users: Vec<UserId>, text: String) {
        if !users.is_empty() {
            self.items.push((users, text));
        }
    }

    pub fn into_items(self) -> Vec<(Vec<UserId>, String)> {
        self.items
    }
}

pub fn booked(name: &str, holder: &str, duration: Duration, until: &DateTime<Utc>) -> String {
    format!(
        "{} is now booked by {} for {} (until {})",
        name,
        holder,
        format_duration(duration),
        format_clock_time(until)
    )
}

pub fn released(name: &str) -> String {
    format!("{} is free again", name)
}

pub fn expired_for_holder(name: &str) -> String {
    format!("Your booking of {} has expired. The resource was released.", name)
}

pub fn expired_for_subscribers(name: &str) -> String {
    format!("{} is free again (booking expired)", name)
}

pub fn near_expiry(name: &str, remaining: Duration) -> String {
    format!(
        "Your booking of {} expires in {}. Use `/rq extend {} <duration>` to extend it.",
        name,
        format_time_left(remaining),
        name
    )
}

pub fn queue_joined(name: &str, waiter: &str) -> String {
    format!("{} joined the queue for {}", waiter, name)
}

pub fn handed_off(name: &str, id: &ResourceId, desired: Duration) -> String {
    format!(
        "{} is free and you are next in the queue. Book it with:\n`/rq book {} {}`",
        name,
        id,
        format_duration(desired)
    )
}
