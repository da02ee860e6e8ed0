//! Error types for time-log domain rules.

use super::TimeLogId;
use thiserror::Error;

/// Errors returned by time-log state changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeLogDomainError {
    /// The session already has an end time.
    #[error("timer {0} is already stopped")]
    AlreadyStopped(TimeLogId),
}
