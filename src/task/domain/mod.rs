//! Domain model for task lifecycle management.
//!
//! Tasks carry an assignment set, a checklist whose completion drives the
//! stored progress and status, and administrator remarks. Everything here is
//! free of infrastructure concerns.

mod checklist;
mod error;
mod ids;
mod remark;
mod report;
mod task;

pub use checklist::{ChecklistItem, Progress, completed_count, derive_progress_and_status};
pub use error::{ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError};
pub use ids::{TaskId, TaskTitle};
pub use remark::Remark;
pub use report::{
    Dashboard, DashboardCharts, DashboardStatistics, PriorityDistribution, RECENT_TASK_LIMIT,
    RecentTask, StatusDistribution, StatusSummary, TaskListEntry,
};
pub use task::{
    Assignees, NewTaskData, PersistedTaskData, Task, TaskPatch, TaskPriority, TaskStatus,
};
