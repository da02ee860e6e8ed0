//! Repository port for time-log persistence.

use crate::identity::UserId;
use crate::task::domain::TaskId;
use crate::time_log::domain::{TimeLog, TimeLogId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for time-log repository operations.
pub type TimeLogRepositoryResult<T> = Result<T, TimeLogRepositoryError>;

/// Time-log persistence contract.
///
/// Implementations own the at-most-one-active-timer rule: [`start`] and
/// [`stop`] must each be a single atomic check-and-write so that racing
/// callers cannot both succeed.
///
/// [`start`]: TimeLogRepository::start
/// [`stop`]: TimeLogRepository::stop
#[async_trait]
pub trait TimeLogRepository: Send + Sync {
    /// Inserts a freshly started time log.
    ///
    /// # Errors
    ///
    /// Returns [`TimeLogRepositoryError::ActiveTimerExists`] when the user
    /// already has a running session on the task, or
    /// [`TimeLogRepositoryError::DuplicateTimeLog`] when the identifier is
    /// taken.
    async fn start(&self, time_log: &TimeLog) -> TimeLogRepositoryResult<()>;

    /// Persists a stopped time log, provided the stored copy is still
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`TimeLogRepositoryError::NotFound`] when the log does not
    /// exist or [`TimeLogRepositoryError::AlreadyStopped`] when the stored
    /// copy already has an end time.
    async fn stop(&self, time_log: &TimeLog) -> TimeLogRepositoryResult<()>;

    /// Finds a time log by identifier.
    async fn find_by_id(&self, id: TimeLogId) -> TimeLogRepositoryResult<Option<TimeLog>>;

    /// Finds the running session for a user on a task.
    async fn find_active(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TimeLogRepositoryResult<Option<TimeLog>>;

    /// Returns every time log for a task ordered by start time, newest first.
    async fn list_for_task(&self, task_id: TaskId) -> TimeLogRepositoryResult<Vec<TimeLog>>;
}

/// Errors returned by time-log repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TimeLogRepositoryError {
    /// A time log with the same identifier already exists.
    #[error("duplicate time log identifier: {0}")]
    DuplicateTimeLog(TimeLogId),

    /// The user already has a running session on the task.
    #[error("user {user_id} already has an active timer on task {task_id}")]
    ActiveTimerExists {
        /// Task with the running session.
        task_id: TaskId,
        /// Owner of the running session.
        user_id: UserId,
    },

    /// The stored time log already has an end time.
    #[error("timer {0} is already stopped")]
    AlreadyStopped(TimeLogId),

    /// The time log was not found.
    #[error("time log not found: {0}")]
    NotFound(TimeLogId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TimeLogRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
