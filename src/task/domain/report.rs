//! Read-time projections over task collections: list entries, status
//! summaries and dashboards.

use super::{Task, TaskId, TaskPriority, TaskStatus, TaskTitle};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of recently created tasks included in a dashboard.
pub const RECENT_TASK_LIMIT: usize = 10;

/// A task as returned by list operations, with its completed checklist
/// count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListEntry {
    /// The listed task.
    #[serde(flatten)]
    pub task: Task,
    /// Number of checklist items marked completed.
    pub completed_todo_count: usize,
}

impl From<Task> for TaskListEntry {
    fn from(task: Task) -> Self {
        let completed_todo_count = task.completed_todo_count();
        Self {
            task,
            completed_todo_count,
        }
    }
}

/// Task counts per status within a caller's scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    /// Every task in scope.
    pub all: usize,
    /// Tasks in `Pending`.
    pub pending_tasks: usize,
    /// Tasks in `In Progress`.
    pub in_progress_tasks: usize,
    /// Tasks in `Completed`.
    pub completed_tasks: usize,
}

impl StatusSummary {
    /// Counts tasks per status.
    #[must_use]
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks
            .into_iter()
            .fold(Self::default(), |mut summary, task| {
                summary.all += 1;
                match task.status() {
                    TaskStatus::Pending => summary.pending_tasks += 1,
                    TaskStatus::InProgress => summary.in_progress_tasks += 1,
                    TaskStatus::Completed => summary.completed_tasks += 1,
                }
                summary
            })
    }
}

/// Headline dashboard numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    /// Every task in scope.
    pub total_tasks: usize,
    /// Tasks in `Pending`.
    pub pending_tasks: usize,
    /// Tasks in `In Progress`.
    pub in_progress_tasks: usize,
    /// Tasks in `Completed`.
    pub completed_tasks: usize,
    /// Unfinished tasks whose due date has passed.
    pub overdue_tasks: usize,
}

/// Task counts keyed by status, plus the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusDistribution {
    /// Tasks in `Pending`.
    pub pending: usize,
    /// Tasks in `In Progress`.
    pub in_progress: usize,
    /// Tasks in `Completed`.
    pub completed: usize,
    /// Every task in scope.
    pub all: usize,
}

/// Task counts keyed by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriorityDistribution {
    /// Low priority tasks.
    pub low: usize,
    /// Medium priority tasks.
    pub medium: usize,
    /// High priority tasks.
    pub high: usize,
}

/// Chart series shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    /// Distribution by status.
    pub task_distribution: StatusDistribution,
    /// Distribution by priority.
    pub task_priority_levels: PriorityDistribution,
}

/// Slim projection of a recently created task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    /// Task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: TaskTitle,
    /// Task status.
    pub status: TaskStatus,
    /// Task priority.
    pub priority: TaskPriority,
    /// Task due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for RecentTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().clone(),
            status: task.status(),
            priority: task.priority(),
            due_date: task.due_date(),
            created_at: task.created_at(),
        }
    }
}

/// Aggregate dashboard over a set of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Headline counts.
    pub statistics: DashboardStatistics,
    /// Chart series.
    pub charts: DashboardCharts,
    /// The most recently created tasks, newest first.
    pub recent_tasks: Vec<RecentTask>,
}

impl Dashboard {
    /// Aggregates the tasks in scope as of `now`.
    #[must_use]
    pub fn build(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let summary = StatusSummary::tally(tasks);
        let overdue_tasks = tasks.iter().filter(|task| task.is_overdue(now)).count();
        let mut priorities = PriorityDistribution::default();
        for task in tasks {
            match task.priority() {
                TaskPriority::Low => priorities.low += 1,
                TaskPriority::Medium => priorities.medium += 1,
                TaskPriority::High => priorities.high += 1,
            }
        }

        let mut newest_first: Vec<&Task> = tasks.iter().collect();
        newest_first.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        let recent_tasks = newest_first
            .into_iter()
            .take(RECENT_TASK_LIMIT)
            .map(RecentTask::from)
            .collect();

        Self {
            statistics: DashboardStatistics {
                total_tasks: summary.all,
                pending_tasks: summary.pending_tasks,
                in_progress_tasks: summary.in_progress_tasks,
                completed_tasks: summary.completed_tasks,
                overdue_tasks,
            },
            charts: DashboardCharts {
                task_distribution: StatusDistribution {
                    pending: summary.pending_tasks,
                    in_progress: summary.in_progress_tasks,
                    completed: summary.completed_tasks,
                    all: summary.all,
                },
                task_priority_levels: priorities,
            },
            recent_tasks,
        }
    }
}
