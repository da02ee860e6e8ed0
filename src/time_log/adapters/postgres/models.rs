//! Diesel row models for time-log persistence.

use super::schema::time_logs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for time-log records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = time_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeLogRow {
    /// Time-log identifier.
    pub id: uuid::Uuid,
    /// Task the time was logged against.
    pub task_id: uuid::Uuid,
    /// Owner of the session.
    pub user_id: uuid::Uuid,
    /// Session start.
    pub start_time: DateTime<Utc>,
    /// Session end.
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed milliseconds.
    pub duration_ms: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for time-log records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = time_logs)]
pub struct NewTimeLogRow {
    /// Time-log identifier.
    pub id: uuid::Uuid,
    /// Task the time was logged against.
    pub task_id: uuid::Uuid,
    /// Owner of the session.
    pub user_id: uuid::Uuid,
    /// Session start.
    pub start_time: DateTime<Utc>,
    /// Session end.
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed milliseconds.
    pub duration_ms: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
