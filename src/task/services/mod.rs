//! Application services for task lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    CreateTaskRequest, DashboardScope, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService, TaskListing, UpdateTaskRequest, MAX_WRITE_ATTEMPTS,
};
