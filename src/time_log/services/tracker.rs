//! Service layer for starting, stopping and listing task timers.

use crate::error::ErrorKind;
use crate::identity::{Actor, UserId};
use crate::task::{
    domain::{Task, TaskId},
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::time_log::{
    domain::{TimeLog, TimeLogDomainError, TimeLogId, TimeSheet},
    ports::{TimeLogRepository, TimeLogRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for time tracking.
#[derive(Debug, Error)]
pub enum TimeTrackingError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The referenced time log does not exist.
    #[error("time log not found: {0}")]
    TimeLogNotFound(TimeLogId),

    /// The time log was recorded against a different task.
    #[error("time log {time_log_id} does not belong to task {task_id}")]
    TaskMismatch {
        /// Task named in the request.
        task_id: TaskId,
        /// Time log named in the request.
        time_log_id: TimeLogId,
    },

    /// The caller lacks the role, assignment or ownership required.
    #[error("user {user_id} is not permitted to {action}")]
    Forbidden {
        /// The refused caller.
        user_id: UserId,
        /// Description of the refused operation.
        action: &'static str,
    },

    /// A domain state change was rejected.
    #[error(transparent)]
    Domain(#[from] TimeLogDomainError),

    /// Task lookup failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),

    /// Time-log persistence failed or rejected the write.
    #[error(transparent)]
    Repository(#[from] TimeLogRepositoryError),
}

impl TimeTrackingError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_)
            | Self::TimeLogNotFound(_)
            | Self::TaskRepository(TaskRepositoryError::NotFound(_))
            | Self::Repository(TimeLogRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::TaskMismatch { .. } => ErrorKind::Validation,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Domain(TimeLogDomainError::AlreadyStopped(_))
            | Self::TaskRepository(
                TaskRepositoryError::DuplicateTask(_) | TaskRepositoryError::StaleTask(_),
            )
            | Self::Repository(
                TimeLogRepositoryError::ActiveTimerExists { .. }
                | TimeLogRepositoryError::AlreadyStopped(_)
                | TimeLogRepositoryError::DuplicateTimeLog(_),
            ) => ErrorKind::Conflict,
            Self::TaskRepository(TaskRepositoryError::Persistence(_))
            | Self::Repository(TimeLogRepositoryError::Persistence(_)) => ErrorKind::Internal,
        }
    }
}

/// Result type for time-tracking service operations.
pub type TimeTrackingResult<T> = Result<T, TimeTrackingError>;

/// Time-tracking orchestration service.
///
/// Tasks are only read, to check existence and assignment.
#[derive(Clone)]
pub struct TimeTrackingService<T, L, C>
where
    T: TaskRepository,
    L: TimeLogRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    time_logs: Arc<L>,
    clock: Arc<C>,
}

impl<T, L, C> TimeTrackingService<T, L, C>
where
    T: TaskRepository,
    L: TimeLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new time-tracking service.
    #[must_use]
    pub const fn new(tasks: Arc<T>, time_logs: Arc<L>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            time_logs,
            clock,
        }
    }

    /// Returns the caller's running session on a task, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TimeTrackingError::TaskNotFound`] when the task does not
    /// exist or [`TimeTrackingError::Forbidden`] unless the caller is
    /// assigned or an administrator.
    pub async fn get_active(
        &self,
        task_id: TaskId,
        actor: &Actor,
    ) -> TimeTrackingResult<Option<TimeLog>> {
        let task = self.find_task(task_id).await?;
        require_assigned_or_admin(actor, &task, "read the active timer")?;
        Ok(self.time_logs.find_active(task_id, actor.id()).await?)
    }

    /// Starts a timer for the caller on a task.
    ///
    /// # Errors
    ///
    /// Returns [`TimeTrackingError::TaskNotFound`] when the task does not
    /// exist, [`TimeTrackingError::Forbidden`] unless the caller is assigned
    /// or an administrator, or [`TimeTrackingError::Repository`] with
    /// [`TimeLogRepositoryError::ActiveTimerExists`] when a timer is already
    /// running.
    pub async fn start(&self, task_id: TaskId, actor: &Actor) -> TimeTrackingResult<TimeLog> {
        let task = self.find_task(task_id).await?;
        require_assigned_or_admin(actor, &task, "start a timer")?;
        let time_log = TimeLog::start(task_id, actor.id(), &*self.clock);
        self.time_logs.start(&time_log).await.inspect_err(|err| {
            if matches!(err, TimeLogRepositoryError::ActiveTimerExists { .. }) {
                tracing::info!(task_id = %task_id, user_id = %actor.id(), "timer already running");
            }
        })?;
        tracing::info!(
            task_id = %task_id,
            user_id = %actor.id(),
            time_log_id = %time_log.id(),
            "timer started"
        );
        Ok(time_log)
    }

    /// Stops a running timer and records its duration.
    ///
    /// # Errors
    ///
    /// Returns [`TimeTrackingError::TimeLogNotFound`] when the log does not
    /// exist, [`TimeTrackingError::TaskMismatch`] when it belongs to another
    /// task, [`TimeTrackingError::Forbidden`] unless the caller owns it or is
    /// an administrator, or a conflict when it was already stopped.
    pub async fn stop(
        &self,
        task_id: TaskId,
        time_log_id: TimeLogId,
        actor: &Actor,
    ) -> TimeTrackingResult<TimeLog> {
        let mut time_log = self
            .time_logs
            .find_by_id(time_log_id)
            .await?
            .ok_or(TimeTrackingError::TimeLogNotFound(time_log_id))?;
        if time_log.task_id() != task_id {
            tracing::warn!(
                task_id = %task_id,
                time_log_id = %time_log_id,
                logged_task_id = %time_log.task_id(),
                "stop requested against the wrong task"
            );
            return Err(TimeTrackingError::TaskMismatch {
                task_id,
                time_log_id,
            });
        }
        if !actor.owns_or_admin(time_log.user_id()) {
            return Err(forbidden(actor, "stop another user's timer"));
        }
        time_log.stop(&*self.clock)?;
        self.time_logs.stop(&time_log).await?;
        tracing::info!(
            task_id = %task_id,
            user_id = %actor.id(),
            time_log_id = %time_log_id,
            duration_ms = time_log.duration_ms(),
            "timer stopped"
        );
        Ok(time_log)
    }

    /// Lists every session on a task, newest first, with the total duration.
    ///
    /// # Errors
    ///
    /// Returns [`TimeTrackingError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn list_for_task(
        &self,
        task_id: TaskId,
        actor: &Actor,
    ) -> TimeTrackingResult<TimeSheet> {
        self.find_task(task_id).await?;
        tracing::debug!(task_id = %task_id, user_id = %actor.id(), "listing time logs");
        let time_logs = self.time_logs.list_for_task(task_id).await?;
        Ok(TimeSheet::new(time_logs))
    }

    async fn find_task(&self, task_id: TaskId) -> TimeTrackingResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TimeTrackingError::TaskNotFound(task_id))
    }
}

fn forbidden(actor: &Actor, action: &'static str) -> TimeTrackingError {
    tracing::warn!(user_id = %actor.id(), role = %actor.role(), action, "operation refused");
    TimeTrackingError::Forbidden {
        user_id: actor.id(),
        action,
    }
}

fn require_assigned_or_admin(
    actor: &Actor,
    task: &Task,
    action: &'static str,
) -> TimeTrackingResult<()> {
    if actor.can_act_on(task.assigned_to().as_slice()) {
        Ok(())
    } else {
        Err(forbidden(actor, action))
    }
}
