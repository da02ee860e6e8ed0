//! Timed work sessions recorded against tasks.

use super::{TimeLogDomainError, TimeLogId};
use crate::identity::UserId;
use crate::task::domain::TaskId;
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One user's work session on one task, bounded by start and stop.
///
/// A log without an end time is the user's active timer for that task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    id: TimeLogId,
    #[serde(rename = "task")]
    task_id: TaskId,
    #[serde(rename = "user")]
    user_id: UserId,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    #[serde(rename = "duration")]
    duration_ms: Option<i64>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted time log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTimeLogData {
    /// Persisted identifier.
    pub id: TimeLogId,
    /// Task the time was logged against.
    pub task_id: TaskId,
    /// User who logged the time.
    pub user_id: UserId,
    /// Session start.
    pub start_time: DateTime<Utc>,
    /// Session end, unset while running.
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed milliseconds, set once stopped.
    pub duration_ms: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TimeLog {
    /// Starts a new session at the current clock time.
    ///
    /// Session bounds are kept at millisecond precision so the recorded
    /// duration always equals `end_time - start_time`.
    #[must_use]
    pub fn start(task_id: TaskId, user_id: UserId, clock: &impl Clock) -> Self {
        let now = clock.utc().trunc_subsecs(3);
        Self {
            id: TimeLogId::new(),
            task_id,
            user_id,
            start_time: now,
            end_time: None,
            duration_ms: None,
            created_at: now,
        }
    }

    /// Reconstructs a time log from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTimeLogData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            user_id: data.user_id,
            start_time: data.start_time,
            end_time: data.end_time,
            duration_ms: data.duration_ms,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> TimeLogId {
        self.id
    }

    /// Returns the task the session belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the user who owns the session.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns when the session started.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns when the session stopped, if it has.
    #[must_use]
    pub const fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Returns the elapsed milliseconds once stopped.
    #[must_use]
    pub const fn duration_ms(&self) -> Option<i64> {
        self.duration_ms
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` while the session has no end time.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Stops the session at the current clock time and records its duration.
    ///
    /// # Errors
    ///
    /// Returns [`TimeLogDomainError::AlreadyStopped`] when the session has
    /// already been stopped; the log is left unchanged.
    pub fn stop(&mut self, clock: &impl Clock) -> Result<(), TimeLogDomainError> {
        if self.end_time.is_some() {
            return Err(TimeLogDomainError::AlreadyStopped(self.id));
        }
        let end = clock.utc().trunc_subsecs(3);
        self.duration_ms = Some((end - self.start_time).num_milliseconds());
        self.end_time = Some(end);
        Ok(())
    }
}

/// Every session logged against a task, newest first, with the total of the
/// stopped sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSheet {
    time_logs: Vec<TimeLog>,
    total_duration_ms: i64,
}

impl TimeSheet {
    /// Builds a time sheet; active sessions contribute nothing to the total.
    #[must_use]
    pub fn new(time_logs: Vec<TimeLog>) -> Self {
        let total_duration_ms = time_logs
            .iter()
            .filter_map(TimeLog::duration_ms)
            .fold(0_i64, i64::saturating_add);
        Self {
            time_logs,
            total_duration_ms,
        }
    }

    /// Returns the sessions.
    #[must_use]
    pub fn time_logs(&self) -> &[TimeLog] {
        &self.time_logs
    }

    /// Returns the summed duration of stopped sessions.
    #[must_use]
    pub const fn total_duration_ms(&self) -> i64 {
        self.total_duration_ms
    }
}
