//! Outbound collaborator interfaces for rqd
//!
//! The core never talks to a chat platform directly. It formats plain text
//! and hands it to a [`Notifier`], and asks an [`Identity`] provider for
//! display names and privilege checks. This crate contains no platform code
//! itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
