//! Port contracts for time tracking.

pub mod repository;

pub use repository::{TimeLogRepository, TimeLogRepositoryError, TimeLogRepositoryResult};
