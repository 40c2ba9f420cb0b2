//! Booking, queue and expiry engine for rqd
//!
//! This crate is the heart of rqd, containing:
//! - Resource directory (admin-only create/update/delete, lookup by name)
//! - Booking ledger (book, extend, release) with a shared close-out
//! - Per-resource wait queues with hand-off on release or expiry
//! - Subscriptions and a bounded session history
//! - The expiry scheduler that reconciles expired bookings and warns holders
//!
//! Every per-resource read-modify-write runs under an in-process lock for
//! that resource, since the underlying store has no transactions.

mod directory;
mod engine;
mod events;
mod history;
mod ledger;
mod locks;
mod messages;
mod model;
mod queue;
mod scheduler;
mod status;
mod subscriptions;

#[cfg(test)]
mod test_support;

pub use engine::*;
pub use events::*;
pub use ledger::{CloseOut, CloseReason};
pub use model::*;
pub use scheduler::*;
