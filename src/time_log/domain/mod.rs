//! Domain model for time tracking.
//!
//! A time log is a single start/stop session by one user on one task. At
//! most one session per (task, user) may be running at a time; that rule is
//! enforced by the repository port, which is the only place that can see
//! concurrent starts.

mod error;
mod ids;
mod time_log;

pub use error::TimeLogDomainError;
pub use ids::TimeLogId;
pub use time_log::{PersistedTimeLogData, TimeLog, TimeSheet};
