//! Checklist items and the progress/status derivation they drive.

use super::{TaskDomainError, TaskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single to-do entry on a task checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    text: String,
    #[serde(default)]
    completed: bool,
}

impl ChecklistItem {
    /// Creates a checklist item with an explicit completion flag.
    #[must_use]
    pub fn new(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: text.into(),
            completed,
        }
    }

    /// Creates an item that has not been completed yet.
    #[must_use]
    pub fn pending(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    /// Returns the item text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns `true` when the item is done.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
    }

    pub(super) const fn mark_completed(&mut self) {
        self.completed = true;
    }
}

/// Percentage of completed checklist items, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    /// No checklist item completed.
    pub const ZERO: Self = Self(0);
    /// Every checklist item completed.
    pub const COMPLETE: Self = Self(100);

    /// Validates a persisted progress value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidProgress`] when the value is outside
    /// `0..=100`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        u8::try_from(value)
            .ok()
            .filter(|percent| *percent <= 100)
            .map(Self)
            .ok_or(TaskDomainError::InvalidProgress(value))
    }

    /// Computes `round(100 * completed / total)`, rounding halves up, or zero
    /// for an empty checklist.
    #[must_use]
    pub fn from_counts(completed: usize, total: usize) -> Self {
        let bounded = completed.min(total);
        let rounded = bounded
            .saturating_mul(200)
            .saturating_add(total)
            .checked_div(total.saturating_mul(2))
            .unwrap_or(0);
        Self(u8::try_from(rounded.min(100)).unwrap_or(100))
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Progress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Number of completed items in a checklist.
#[must_use]
pub fn completed_count(checklist: &[ChecklistItem]) -> usize {
    checklist.iter().filter(|item| item.completed()).count()
}

/// Derives the stored progress and status from a checklist.
///
/// 100% is `Completed`, anything above zero is `InProgress`, and an empty
/// or untouched checklist is `Pending`.
#[must_use]
pub fn derive_progress_and_status(checklist: &[ChecklistItem]) -> (Progress, TaskStatus) {
    let progress = Progress::from_counts(completed_count(checklist), checklist.len());
    let status = match progress.value() {
        100 => TaskStatus::Completed,
        0 => TaskStatus::Pending,
        _ => TaskStatus::InProgress,
    };
    (progress, status)
}
