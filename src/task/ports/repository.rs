//! Repository port for task persistence and lookup.

use crate::identity::UserId;
use crate::task::domain::{Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Filter applied by [`TaskRepository::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    assignee: Option<UserId>,
    status: Option<TaskStatus>,
}

impl TaskQuery {
    /// Matches every task.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            assignee: None,
            status: None,
        }
    }

    /// Matches tasks assigned to `user`.
    #[must_use]
    pub const fn assigned_to(user: UserId) -> Self {
        Self {
            assignee: Some(user),
            status: None,
        }
    }

    /// Restricts the query to a single status when one is given.
    #[must_use]
    pub const fn with_status(mut self, status: Option<TaskStatus>) -> Self {
        self.status = status;
        self
    }

    /// Returns the assignee restriction, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the status restriction, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns `true` when `task` satisfies the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.assignee.is_none_or(|user| task.is_assigned_to(user))
            && self.status.is_none_or(|status| task.status() == status)
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task, provided the stored copy is
    /// still at `expected_revision`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist,
    /// or [`TaskRepositoryError::StaleTask`] when another write landed after
    /// the task was read.
    async fn update(&self, task: &Task, expected_revision: u64) -> TaskRepositoryResult<()>;

    /// Removes a task. Time logs recorded against it are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the tasks matching `query`, newest first.
    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The task changed after it was read.
    #[error("task {0} was modified concurrently")]
    StaleTask(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
