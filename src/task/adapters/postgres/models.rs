//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Priority label.
    pub priority: String,
    /// Status label.
    pub status: String,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creating administrator.
    pub created_by: uuid::Uuid,
    /// Ordered assignment set.
    pub assigned_to: Vec<uuid::Uuid>,
    /// Attachment links JSON payload.
    pub attachments: Value,
    /// Checklist JSON payload.
    pub todo_checklist: Value,
    /// Derived completion percentage.
    pub progress: i16,
    /// Remarks JSON payload.
    pub remarks: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Write counter checked by conditional updates.
    pub revision: i64,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Priority label.
    pub priority: String,
    /// Status label.
    pub status: String,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creating administrator.
    pub created_by: uuid::Uuid,
    /// Ordered assignment set.
    pub assigned_to: Vec<uuid::Uuid>,
    /// Attachment links JSON payload.
    pub attachments: Value,
    /// Checklist JSON payload.
    pub todo_checklist: Value,
    /// Derived completion percentage.
    pub progress: i16,
    /// Remarks JSON payload.
    pub remarks: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Write counter checked by conditional updates.
    pub revision: i64,
}

/// Changeset written when an existing task is updated.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Priority label.
    pub priority: String,
    /// Status label.
    pub status: String,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Ordered assignment set.
    pub assigned_to: Vec<uuid::Uuid>,
    /// Attachment links JSON payload.
    pub attachments: Value,
    /// Checklist JSON payload.
    pub todo_checklist: Value,
    /// Derived completion percentage.
    pub progress: i16,
    /// Remarks JSON payload.
    pub remarks: Value,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Write counter checked by conditional updates.
    pub revision: i64,
}
