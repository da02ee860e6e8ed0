//! Service layer for task creation, mutation, listing and dashboards.

use crate::error::ErrorKind;
use crate::identity::{Actor, UserId};
use crate::task::{
    domain::{
        Assignees, ChecklistItem, Dashboard, NewTaskData, Remark, StatusSummary, Task,
        TaskDomainError, TaskId, TaskListEntry, TaskPatch, TaskPriority, TaskStatus, TaskTitle,
    },
    ports::{TaskQuery, TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Read-modify-write rounds attempted before a contended update gives up.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    assigned_to: Vec<UserId>,
    attachments: Vec<String>,
    todo_checklist: Vec<ChecklistItem>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::default(),
            due_date: None,
            assigned_to: Vec::new(),
            attachments: Vec::new(),
            todo_checklist: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the assigned users.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = UserId>) -> Self {
        self.assigned_to = assignees.into_iter().collect();
        self
    }

    /// Sets the attachment links.
    #[must_use]
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = String>) -> Self {
        self.attachments = attachments.into_iter().collect();
        self
    }

    /// Sets the initial checklist.
    #[must_use]
    pub fn with_checklist(mut self, checklist: impl IntoIterator<Item = ChecklistItem>) -> Self {
        self.todo_checklist = checklist.into_iter().collect();
        self
    }
}

/// Request payload for a presence-based task update.
///
/// Only the fields that were set are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    priority: Option<TaskPriority>,
    due_date: Option<DateTime<Utc>>,
    assigned_to: Option<Vec<UserId>>,
    attachments: Option<Vec<String>>,
    todo_checklist: Option<Vec<ChecklistItem>>,
}

impl UpdateTaskRequest {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replaces the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Replaces the assignment set.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = UserId>) -> Self {
        self.assigned_to = Some(assignees.into_iter().collect());
        self
    }

    /// Replaces the attachment links.
    #[must_use]
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = String>) -> Self {
        self.attachments = Some(attachments.into_iter().collect());
        self
    }

    /// Replaces the checklist.
    #[must_use]
    pub fn with_checklist(mut self, checklist: impl IntoIterator<Item = ChecklistItem>) -> Self {
        self.todo_checklist = Some(checklist.into_iter().collect());
        self
    }

    fn into_patch(self) -> Result<TaskPatch, TaskDomainError> {
        let Self {
            title,
            description,
            priority,
            due_date,
            assigned_to,
            attachments,
            todo_checklist,
        } = self;
        Ok(TaskPatch {
            title: title.map(TaskTitle::new).transpose()?,
            description,
            priority,
            due_date,
            assigned_to: assigned_to.map(Assignees::new),
            attachments,
            todo_checklist,
        })
    }
}

/// Which tasks a dashboard aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardScope {
    /// Every task; administrators only.
    Global,
    /// Tasks assigned to one user.
    User(UserId),
}

/// Tasks visible to a caller together with per-status counts over the same
/// scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListing {
    /// Matching tasks, newest first.
    pub tasks: Vec<TaskListEntry>,
    /// Counts over the caller's scope, ignoring the status filter.
    pub status_summary: StatusSummary,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The caller lacks the role or assignment required.
    #[error("user {user_id} is not permitted to {action}")]
    Forbidden {
        /// The refused caller.
        user_id: UserId,
        /// Description of the refused operation.
        action: &'static str,
    },

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

impl TaskLifecycleError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::Repository(TaskRepositoryError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Repository(
                TaskRepositoryError::DuplicateTask(_) | TaskRepositoryError::StaleTask(_),
            ) => ErrorKind::Conflict,
            Self::Repository(TaskRepositoryError::Persistence(_)) => ErrorKind::Internal,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task owned by the calling administrator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-admin callers,
    /// [`TaskLifecycleError::Domain`] for a blank title, or
    /// [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn create(
        &self,
        request: CreateTaskRequest,
        actor: &Actor,
    ) -> TaskLifecycleResult<Task> {
        require_admin(actor, "create tasks")?;
        let CreateTaskRequest {
            title,
            description,
            priority,
            due_date,
            assigned_to,
            attachments,
            todo_checklist,
        } = request;

        let data = NewTaskData {
            title: TaskTitle::new(title)?,
            description,
            priority,
            due_date,
            assigned_to: Assignees::new(assigned_to),
            attachments,
            todo_checklist,
        };
        let task = Task::new(data, actor.id(), &*self.clock);
        self.repository.store(&task).await?;
        tracing::info!(task_id = %task.id(), created_by = %actor.id(), "task created");
        Ok(task)
    }

    /// Returns a task with all fields, remarks included.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist.
    pub async fn get(&self, id: TaskId, actor: &Actor) -> TaskLifecycleResult<Task> {
        tracing::debug!(task_id = %id, user_id = %actor.id(), "fetching task");
        self.find_or_not_found(id).await
    }

    /// Lists the tasks visible to the caller, optionally filtered by status.
    ///
    /// Administrators see every task; members see tasks assigned to them,
    /// without remarks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list(
        &self,
        status: Option<TaskStatus>,
        actor: &Actor,
    ) -> TaskLifecycleResult<TaskListing> {
        let scope = if actor.is_admin() {
            TaskQuery::all()
        } else {
            TaskQuery::assigned_to(actor.id())
        };
        let scoped = self.repository.list(&scope).await?;
        let status_summary = StatusSummary::tally(&scoped);
        let filter = scope.with_status(status);
        let tasks = scoped
            .into_iter()
            .filter(|task| filter.matches(task))
            .map(|task| {
                if actor.is_admin() {
                    task
                } else {
                    task.without_remarks()
                }
            })
            .map(TaskListEntry::from)
            .collect();
        Ok(TaskListing {
            tasks,
            status_summary,
        })
    }

    /// Lists the tasks assigned to `user`; administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-admin callers or
    /// [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_for_user(
        &self,
        user: UserId,
        status: Option<TaskStatus>,
        actor: &Actor,
    ) -> TaskLifecycleResult<Vec<TaskListEntry>> {
        require_admin(actor, "list another user's tasks")?;
        let query = TaskQuery::assigned_to(user).with_status(status);
        let tasks = self.repository.list(&query).await?;
        Ok(tasks.into_iter().map(TaskListEntry::from).collect())
    }

    /// Applies a presence-based update; administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-admin callers,
    /// [`TaskLifecycleError::Domain`] for a blank replacement title,
    /// [`TaskLifecycleError::NotFound`] when the task does not exist, or
    /// [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn update(
        &self,
        id: TaskId,
        request: UpdateTaskRequest,
        actor: &Actor,
    ) -> TaskLifecycleResult<Task> {
        require_admin(actor, "edit tasks")?;
        let patch = request.into_patch()?;
        let task = self
            .modify(id, |task| {
                task.apply_patch(patch.clone(), &*self.clock);
                Ok(())
            })
            .await?;
        tracing::info!(task_id = %id, user_id = %actor.id(), "task updated");
        Ok(task)
    }

    /// Deletes a task; administrators only. Time logs are kept.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-admin callers or
    /// [`TaskLifecycleError::Repository`] when the task does not exist or
    /// persistence fails.
    pub async fn delete(&self, id: TaskId, actor: &Actor) -> TaskLifecycleResult<()> {
        require_admin(actor, "delete tasks")?;
        self.repository.delete(id).await?;
        tracing::info!(task_id = %id, user_id = %actor.id(), "task deleted");
        Ok(())
    }

    /// Sets the status explicitly; completing a task force-completes its
    /// checklist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist,
    /// [`TaskLifecycleError::Forbidden`] unless the caller is assigned or an
    /// administrator, or [`TaskLifecycleError::Repository`] when persistence
    /// fails.
    pub async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        actor: &Actor,
    ) -> TaskLifecycleResult<Task> {
        let task = self
            .modify(id, |task| {
                require_assigned_or_admin(actor, task, "update the task status")?;
                task.set_status(status, &*self.clock);
                Ok(())
            })
            .await?;
        tracing::info!(task_id = %id, user_id = %actor.id(), status = %status, "task status updated");
        Ok(task)
    }

    /// Replaces the checklist and re-derives progress and status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist,
    /// [`TaskLifecycleError::Forbidden`] unless the caller is assigned or an
    /// administrator, or [`TaskLifecycleError::Repository`] when persistence
    /// fails.
    pub async fn update_checklist(
        &self,
        id: TaskId,
        checklist: Vec<ChecklistItem>,
        actor: &Actor,
    ) -> TaskLifecycleResult<Task> {
        let task = self
            .modify(id, |task| {
                require_assigned_or_admin(actor, task, "update the checklist")?;
                task.replace_checklist(checklist.clone(), &*self.clock);
                Ok(())
            })
            .await?;
        tracing::info!(
            task_id = %id,
            user_id = %actor.id(),
            progress = task.progress().value(),
            status = %task.status(),
            "task checklist updated"
        );
        Ok(task)
    }

    /// Appends a remark; administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-admin callers,
    /// [`TaskLifecycleError::Domain`] for blank text,
    /// [`TaskLifecycleError::NotFound`] when the task does not exist, or
    /// [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn add_remark(
        &self,
        id: TaskId,
        text: impl Into<String> + Send,
        actor: &Actor,
    ) -> TaskLifecycleResult<Task> {
        require_admin(actor, "add remarks")?;
        let remark = Remark::new(text, actor.id(), &*self.clock)?;
        let task = self
            .modify(id, |task| {
                task.add_remark(remark.clone(), &*self.clock);
                Ok(())
            })
            .await?;
        tracing::info!(task_id = %id, user_id = %actor.id(), "remark added");
        Ok(task)
    }

    /// Aggregates status, priority and overdue counts plus the most recent
    /// tasks within `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] when a member asks for the
    /// global dashboard or another user's dashboard, or
    /// [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn dashboard(
        &self,
        scope: DashboardScope,
        actor: &Actor,
    ) -> TaskLifecycleResult<Dashboard> {
        let query = match scope {
            DashboardScope::Global => {
                require_admin(actor, "view the global dashboard")?;
                TaskQuery::all()
            }
            DashboardScope::User(user) => {
                if !actor.owns_or_admin(user) {
                    return Err(forbidden(actor, "view another user's dashboard"));
                }
                TaskQuery::assigned_to(user)
            }
        };
        let tasks = self.repository.list(&query).await?;
        Ok(Dashboard::build(&tasks, self.clock.utc()))
    }

    /// Reads the task, applies `change` and writes it back, re-reading and
    /// re-applying when another write landed in between.
    async fn modify<F>(&self, id: TaskId, mut change: F) -> TaskLifecycleResult<Task>
    where
        F: FnMut(&mut Task) -> TaskLifecycleResult<()> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut task = self.find_or_not_found(id).await?;
            let expected_revision = task.revision();
            change(&mut task)?;
            match self.repository.update(&task, expected_revision).await {
                Ok(()) => return Ok(task),
                Err(TaskRepositoryError::StaleTask(_)) => {
                    tracing::debug!(task_id = %id, attempt, "task changed while updating, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        tracing::warn!(task_id = %id, attempts = MAX_WRITE_ATTEMPTS, "task update kept racing");
        Err(TaskRepositoryError::StaleTask(id).into())
    }

    async fn find_or_not_found(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(id))
    }
}

fn forbidden(actor: &Actor, action: &'static str) -> TaskLifecycleError {
    tracing::warn!(user_id = %actor.id(), role = %actor.role(), action, "operation refused");
    TaskLifecycleError::Forbidden {
        user_id: actor.id(),
        action,
    }
}

fn require_admin(actor: &Actor, action: &'static str) -> TaskLifecycleResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(forbidden(actor, action))
    }
}

fn require_assigned_or_admin(
    actor: &Actor,
    task: &Task,
    action: &'static str,
) -> TaskLifecycleResult<()> {
    if actor.can_act_on(task.assigned_to().as_slice()) {
        Ok(())
    } else {
        Err(forbidden(actor, action))
    }
}
