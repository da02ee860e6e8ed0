//! JSON API over the task and time-tracking services.
//!
//! Every `/api` route expects the caller identity in the `X-User-Id` and
//! `X-User-Role` headers; see [`identity::Caller`].

pub mod error;
pub mod identity;
pub mod payload;
mod tasks;
mod time_logs;

use crate::task::ports::TaskRepository;
use crate::task::services::TaskLifecycleService;
use crate::time_log::ports::TimeLogRepository;
use crate::time_log::services::TimeTrackingService;
use axum::Json;
use axum::Router;
use axum::routing::{get, post, put};
use mockable::Clock;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
pub struct AppState<R, L, C>
where
    R: TaskRepository,
    L: TimeLogRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<TaskLifecycleService<R, C>>,
    time_logs: Arc<TimeTrackingService<R, L, C>>,
}

impl<R, L, C> AppState<R, L, C>
where
    R: TaskRepository,
    L: TimeLogRepository,
    C: Clock + Send + Sync,
{
    /// Wires both services over the given repositories and clock.
    #[must_use]
    pub fn new(tasks: Arc<R>, time_logs: Arc<L>, clock: Arc<C>) -> Self {
        Self {
            tasks: Arc::new(TaskLifecycleService::new(
                Arc::clone(&tasks),
                Arc::clone(&clock),
            )),
            time_logs: Arc::new(TimeTrackingService::new(tasks, time_logs, clock)),
        }
    }
}

impl<R, L, C> Clone for AppState<R, L, C>
where
    R: TaskRepository,
    L: TimeLogRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            time_logs: Arc::clone(&self.time_logs),
        }
    }
}

/// Builds the application router.
#[must_use]
pub fn router<R, L, C>(state: AppState<R, L, C>) -> Router
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let api = Router::new()
        .route(
            "/tasks",
            get(tasks::list::<R, L, C>).post(tasks::create::<R, L, C>),
        )
        .route("/tasks/dashboard-data", get(tasks::dashboard::<R, L, C>))
        .route(
            "/tasks/user-dashboard-data",
            get(tasks::user_dashboard::<R, L, C>),
        )
        .route("/tasks/user/{user_id}", get(tasks::list_for_user::<R, L, C>))
        .route(
            "/tasks/{id}",
            get(tasks::get::<R, L, C>)
                .put(tasks::update::<R, L, C>)
                .delete(tasks::delete::<R, L, C>),
        )
        .route("/tasks/{id}/status", put(tasks::update_status::<R, L, C>))
        .route("/tasks/{id}/todo", put(tasks::update_checklist::<R, L, C>))
        .route("/tasks/{id}/remarks", post(tasks::add_remark::<R, L, C>))
        .route("/tasks/{id}/timelogs", get(time_logs::list::<R, L, C>))
        .route(
            "/tasks/{id}/timelogs/active",
            get(time_logs::active::<R, L, C>),
        )
        .route(
            "/tasks/{id}/timelogs/start",
            post(time_logs::start::<R, L, C>),
        )
        .route(
            "/tasks/{id}/timelogs/{time_log_id}/stop",
            put(time_logs::stop::<R, L, C>),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
