//! Reviewer remarks attached to a task.

use super::TaskDomainError;
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A remark left on a task by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    text: String,
    made_by: UserId,
    created_at: DateTime<Utc>,
}

impl Remark {
    /// Creates a remark stamped with the current clock time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyRemark`] when the text is blank.
    pub fn new(
        text: impl Into<String>,
        made_by: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let body = text.into();
        if body.trim().is_empty() {
            return Err(TaskDomainError::EmptyRemark);
        }
        Ok(Self {
            text: body,
            made_by,
            created_at: clock.utc(),
        })
    }

    /// Returns the remark text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the author of the remark.
    #[must_use]
    pub const fn made_by(&self) -> UserId {
        self.made_by
    }

    /// Returns when the remark was made.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
