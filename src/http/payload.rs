//! Request bodies and query strings accepted by the JSON API.

use super::error::ApiError;
use crate::identity::UserId;
use crate::task::domain::{ChecklistItem, TaskId, TaskPriority, TaskStatus};
use crate::task::services::{CreateTaskRequest, UpdateTaskRequest};
use crate::time_log::domain::TimeLogId;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// Body of `POST /tasks`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<TaskPriority>,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    assigned_to: Option<Value>,
    #[serde(default)]
    attachments: Option<Vec<String>>,
    #[serde(default)]
    todo_checklist: Option<Vec<ChecklistItem>>,
}

impl CreateTaskBody {
    /// Converts the body into a service request.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`ApiError`] when `assignedTo` is not an array of user
    /// ids.
    pub fn into_request(self) -> Result<CreateTaskRequest, ApiError> {
        let mut request = CreateTaskRequest::new(self.title);
        if let Some(description) = self.description {
            request = request.with_description(description);
        }
        if let Some(priority) = self.priority {
            request = request.with_priority(priority);
        }
        if let Some(due_date) = self.due_date {
            request = request.with_due_date(due_date);
        }
        if let Some(assigned_to) = self.assigned_to {
            request = request.with_assignees(parse_assignees(assigned_to)?);
        }
        if let Some(attachments) = self.attachments {
            request = request.with_attachments(attachments);
        }
        if let Some(todo_checklist) = self.todo_checklist {
            request = request.with_checklist(todo_checklist);
        }
        Ok(request)
    }
}

/// Body of `PUT /tasks/{id}`; absent keys leave fields untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<TaskPriority>,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    assigned_to: Option<Value>,
    #[serde(default)]
    attachments: Option<Vec<String>>,
    #[serde(default)]
    todo_checklist: Option<Vec<ChecklistItem>>,
}

impl UpdateTaskBody {
    /// Converts the body into a service request.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`ApiError`] when `assignedTo` is present but not an
    /// array of user ids.
    pub fn into_request(self) -> Result<UpdateTaskRequest, ApiError> {
        let mut request = UpdateTaskRequest::new();
        if let Some(title) = self.title {
            request = request.with_title(title);
        }
        if let Some(description) = self.description {
            request = request.with_description(description);
        }
        if let Some(priority) = self.priority {
            request = request.with_priority(priority);
        }
        if let Some(due_date) = self.due_date {
            request = request.with_due_date(due_date);
        }
        if let Some(assigned_to) = self.assigned_to {
            request = request.with_assignees(parse_assignees(assigned_to)?);
        }
        if let Some(attachments) = self.attachments {
            request = request.with_attachments(attachments);
        }
        if let Some(todo_checklist) = self.todo_checklist {
            request = request.with_checklist(todo_checklist);
        }
        Ok(request)
    }
}

/// Body of `PUT /tasks/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    /// Requested status.
    pub status: TaskStatus,
}

/// Body of `PUT /tasks/{id}/todo`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChecklistBody {
    /// Replacement checklist.
    pub todo_checklist: Vec<ChecklistItem>,
}

/// Body of `POST /tasks/{id}/remarks`.
#[derive(Debug, Deserialize)]
pub struct RemarkBody {
    /// Remark text.
    #[serde(default)]
    pub text: String,
}

/// Query string accepted by the task listings.
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    status: Option<String>,
}

impl StatusFilter {
    /// Parses the optional status; an empty value means no filter.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`ApiError`] for an unknown status.
    pub fn parse(&self) -> Result<Option<TaskStatus>, ApiError> {
        self.status
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| TaskStatus::try_from(raw).map_err(|err| ApiError::bad_request(err.to_string())))
            .transpose()
    }
}

fn parse_assignees(value: Value) -> Result<Vec<UserId>, ApiError> {
    if !value.is_array() {
        return Err(ApiError::bad_request("assignedTo must be an array of user ids"));
    }
    serde_json::from_value(value)
        .map_err(|_| ApiError::bad_request("assignedTo must be an array of user ids"))
}

/// Parses a task id from a path segment.
///
/// # Errors
///
/// Returns a 400 [`ApiError`] when the segment is not a UUID.
pub fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    parse_uuid(raw, "task id").map(TaskId::from_uuid)
}

/// Parses a time-log id from a path segment.
///
/// # Errors
///
/// Returns a 400 [`ApiError`] when the segment is not a UUID.
pub fn parse_time_log_id(raw: &str) -> Result<TimeLogId, ApiError> {
    parse_uuid(raw, "time log id").map(TimeLogId::from_uuid)
}

/// Parses a user id from a path segment.
///
/// # Errors
///
/// Returns a 400 [`ApiError`] when the segment is not a UUID.
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    parse_uuid(raw, "user id").map(UserId::from_uuid)
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid {what}: {raw}")))
}
