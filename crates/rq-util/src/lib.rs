//! Shared utilities for rq
//!
//! This crate provides:
//! - ID types (ResourceId, UserId)
//! - Wall-clock helpers with mock time for development
//! - Duration parsing and human-readable formatting
//! - The error type shared by the booking core
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
