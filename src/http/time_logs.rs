//! Timer handlers nested under a task.

use super::AppState;
use super::error::ApiError;
use super::identity::Caller;
use super::payload::{parse_task_id, parse_time_log_id};
use crate::task::ports::TaskRepository;
use crate::time_log::domain::TimeSheet;
use crate::time_log::ports::TimeLogRepository;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use mockable::Clock;
use serde_json::{Value, json};

pub(super) async fn active<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(task_id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task = parse_task_id(&task_id)?;
    let time_log = state.time_logs.get_active(task, &actor).await?;
    Ok(Json(json!({ "activeTimeLog": time_log })))
}

pub(super) async fn start<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(task_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task = parse_task_id(&task_id)?;
    let time_log = state.time_logs.start(task, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Timer started successfully", "timeLog": time_log })),
    ))
}

pub(super) async fn stop<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path((task_id, time_log_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task = parse_task_id(&task_id)?;
    let log = parse_time_log_id(&time_log_id)?;
    let time_log = state.time_logs.stop(task, log, &actor).await?;
    Ok(Json(
        json!({ "message": "Timer stopped successfully", "timeLog": time_log }),
    ))
}

pub(super) async fn list<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(task_id): Path<String>,
) -> Result<Json<TimeSheet>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task = parse_task_id(&task_id)?;
    Ok(Json(state.time_logs.list_for_task(task, &actor).await?))
}
