//! Error types for rq

use thiserror::Error;

use crate::{ResourceId, UserId};

/// Error kinds raised by the booking core
#[derive(Debug, Error)]
pub enum RqError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Resource {0} is already booked")]
    AlreadyBooked(ResourceId),

    #[error("Resource {0} is not booked")]
    NotBooked(ResourceId),

    #[error("User {0} does not hold the booking")]
    NotHolder(UserId),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Total booking length exceeds the maximum of {max_minutes} minutes")]
    DurationExceeded { max_minutes: i64 },

    #[error("User {0} already holds this resource")]
    AlreadyHolder(UserId),

    #[error("User {0} is already queued")]
    AlreadyQueued(UserId),

    #[error("User {0} is already subscribed")]
    AlreadySubscribed(UserId),

    #[error("Queue is full (max {0})")]
    QueueFull(usize),

    #[error("Resource limit reached (max {0})")]
    CapacityExceeded(usize),

    #[error("Invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("Ambiguous resource name, candidates: {}", .0.join(", "))]
    Ambiguous(Vec<String>),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl RqError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid(field: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: msg.into(),
        }
    }

    /// Whether this error came from the storage layer rather than a rule check
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, RqError>;
