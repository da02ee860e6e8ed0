//! Task aggregate root and related lifecycle types.

use super::{
    ChecklistItem, ParseTaskPriorityError, ParseTaskStatusError, Progress, Remark, TaskId,
    TaskTitle, completed_count, derive_progress_and_status,
};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task status.
///
/// Status is a derived view of checklist progress rather than a guarded
/// state machine: any authorised write may set any value, and a checklist
/// update always re-derives it.
///
/// Deserialization accepts the same spellings as [`TaskStatus::try_from`],
/// so `"In Progress"`, `"in_progress"` and `"inprogress"` all parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TaskStatus {
    /// No checklist item completed yet.
    Pending,
    /// Some but not all checklist items completed.
    #[serde(rename = "In Progress")]
    InProgress,
    /// All checklist items completed, or forced complete.
    Completed,
}

impl TaskStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    /// Returns the canonical storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "");
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
///
/// Parsing ignores case and surrounding whitespace on every input path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl TaskPriority {
    /// All priorities in ascending order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the canonical storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseTaskPriorityError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of assigned users; the first occurrence of a duplicate wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct Assignees(Vec<UserId>);

impl Assignees {
    /// Builds an assignment set preserving the first-seen order.
    #[must_use]
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Self {
        let mut ordered: Vec<UserId> = Vec::new();
        for user in users {
            if !ordered.contains(&user) {
                ordered.push(user);
            }
        }
        Self(ordered)
    }

    /// Returns the assigned users in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[UserId] {
        &self.0
    }

    /// Returns `true` when the user is assigned.
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.0.contains(&user)
    }

    /// Returns `true` when nobody is assigned.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of assigned users.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<UserId>> for Assignees {
    fn from(value: Vec<UserId>) -> Self {
        Self::new(value)
    }
}

impl From<Assignees> for Vec<UserId> {
    fn from(value: Assignees) -> Self {
        value.0
    }
}

impl FromIterator<UserId> for Assignees {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: String,
    priority: TaskPriority,
    status: TaskStatus,
    due_date: Option<DateTime<Utc>>,
    created_by: UserId,
    assigned_to: Assignees,
    attachments: Vec<String>,
    todo_checklist: Vec<ChecklistItem>,
    progress: Progress,
    remarks: Vec<Remark>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    revision: u64,
}

/// Parameter object for creating a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Task title.
    pub title: TaskTitle,
    /// Free-form description.
    pub description: String,
    /// Priority.
    pub priority: TaskPriority,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Users the task is assigned to.
    pub assigned_to: Assignees,
    /// Attachment links.
    pub attachments: Vec<String>,
    /// Initial checklist.
    pub todo_checklist: Vec<ChecklistItem>,
}

/// Presence-based field patch applied by administrators.
///
/// A `Some` field replaces the stored value; `None` leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<TaskTitle>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
    /// Replacement due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Replacement assignment set.
    pub assigned_to: Option<Assignees>,
    /// Replacement attachment links.
    pub attachments: Option<Vec<String>>,
    /// Replacement checklist; progress and status are re-derived from it.
    pub todo_checklist: Option<Vec<ChecklistItem>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: String,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted creator.
    pub created_by: UserId,
    /// Persisted assignment set.
    pub assigned_to: Assignees,
    /// Persisted attachment links.
    pub attachments: Vec<String>,
    /// Persisted checklist.
    pub todo_checklist: Vec<ChecklistItem>,
    /// Persisted progress.
    pub progress: Progress,
    /// Persisted remarks.
    pub remarks: Vec<Remark>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted write counter.
    pub revision: u64,
}

impl Task {
    /// Creates a new task owned by `created_by`.
    ///
    /// Progress and status are derived from the initial checklist, so a task
    /// created with an untouched checklist starts `Pending` at 0%.
    #[must_use]
    pub fn new(data: NewTaskData, created_by: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let (progress, status) = derive_progress_and_status(&data.todo_checklist);

        Self {
            id: TaskId::new(),
            title: data.title,
            description: data.description,
            priority: data.priority,
            status,
            due_date: data.due_date,
            created_by,
            assigned_to: data.assigned_to,
            attachments: data.attachments,
            todo_checklist: data.todo_checklist,
            progress,
            remarks: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
            revision: 0,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            due_date: data.due_date,
            created_by: data.created_by,
            assigned_to: data.assigned_to,
            attachments: data.attachments,
            todo_checklist: data.todo_checklist,
            progress: data.progress,
            remarks: data.remarks,
            created_at: data.created_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the task priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the administrator who created the task.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the assignment set.
    #[must_use]
    pub const fn assigned_to(&self) -> &Assignees {
        &self.assigned_to
    }

    /// Returns the attachment links.
    #[must_use]
    pub fn attachments(&self) -> &[String] {
        &self.attachments
    }

    /// Returns the checklist.
    #[must_use]
    pub fn todo_checklist(&self) -> &[ChecklistItem] {
        &self.todo_checklist
    }

    /// Returns the stored progress.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the remarks in the order they were made.
    #[must_use]
    pub fn remarks(&self) -> &[Remark] {
        &self.remarks
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Number of completed checklist items.
    #[must_use]
    pub fn completed_todo_count(&self) -> usize {
        completed_count(&self.todo_checklist)
    }

    /// Returns the write counter, bumped by every mutation.
    ///
    /// Repositories compare it to detect writes made since the task was read.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` when the user is in the assignment set.
    #[must_use]
    pub fn is_assigned_to(&self, user: UserId) -> bool {
        self.assigned_to.contains(user)
    }

    /// Returns `true` when the task is not completed and its due date lies
    /// strictly before `now`.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Merges the present fields of `patch` over the task.
    pub fn apply_patch(&mut self, patch: TaskPatch, clock: &impl Clock) {
        let TaskPatch {
            title,
            description,
            priority,
            due_date,
            assigned_to,
            attachments,
            todo_checklist,
        } = patch;

        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = priority {
            self.priority = value;
        }
        if let Some(value) = due_date {
            self.due_date = Some(value);
        }
        if let Some(value) = assigned_to {
            self.assigned_to = value;
        }
        if let Some(value) = attachments {
            self.attachments = value;
        }
        if let Some(value) = todo_checklist {
            self.set_checklist(value);
        }
        self.touch(clock);
    }

    /// Replaces the checklist and re-derives progress and status.
    ///
    /// Any previously forced status is overwritten.
    pub fn replace_checklist(&mut self, checklist: Vec<ChecklistItem>, clock: &impl Clock) {
        self.set_checklist(checklist);
        self.touch(clock);
    }

    /// Sets the status explicitly.
    ///
    /// Setting [`TaskStatus::Completed`] marks every checklist item completed
    /// and forces progress to 100; other statuses leave progress untouched.
    pub fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) {
        self.status = status;
        if status == TaskStatus::Completed {
            for item in &mut self.todo_checklist {
                item.mark_completed();
            }
            self.progress = Progress::COMPLETE;
        }
        self.touch(clock);
    }

    /// Appends a remark.
    pub fn add_remark(&mut self, remark: Remark, clock: &impl Clock) {
        self.remarks.push(remark);
        self.touch(clock);
    }

    /// Drops the remarks, for listings shown to members.
    #[must_use]
    pub fn without_remarks(mut self) -> Self {
        self.remarks.clear();
        self
    }

    fn set_checklist(&mut self, checklist: Vec<ChecklistItem>) {
        let (progress, status) = derive_progress_and_status(&checklist);
        self.todo_checklist = checklist;
        self.progress = progress;
        self.status = status;
    }

    /// Stamps `updated_at` with the current clock time and bumps the
    /// revision.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.revision = self.revision.saturating_add(1);
    }
}
