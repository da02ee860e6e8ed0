//! Task lifecycle handlers.

use super::AppState;
use super::error::ApiError;
use super::identity::Caller;
use super::payload::{
    CreateTaskBody, RemarkBody, StatusFilter, UpdateChecklistBody, UpdateStatusBody,
    UpdateTaskBody, parse_task_id, parse_user_id,
};
use crate::task::domain::{Dashboard, Task};
use crate::task::ports::TaskRepository;
use crate::task::services::{DashboardScope, TaskListing};
use crate::time_log::ports::TimeLogRepository;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use mockable::Clock;
use serde_json::{Value, json};

pub(super) async fn list<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<TaskListing>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let status = filter.parse()?;
    Ok(Json(state.tasks.list(status, &actor).await?))
}

pub(super) async fn list_for_user<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(user_id): Path<String>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Value>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let user = parse_user_id(&user_id)?;
    let status = filter.parse()?;
    let tasks = state.tasks.list_for_user(user, status, &actor).await?;
    Ok(Json(json!({ "tasks": tasks })))
}

pub(super) async fn get<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task_id = parse_task_id(&id)?;
    Ok(Json(state.tasks.get(task_id, &actor).await?))
}

pub(super) async fn create<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    payload: Result<Json<CreateTaskBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Json(body) = payload?;
    let task = state.tasks.create(body.into_request()?, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Task created successfully", "task": task })),
    ))
}

pub(super) async fn update<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task_id = parse_task_id(&id)?;
    let Json(body) = payload?;
    let updated = state
        .tasks
        .update(task_id, body.into_request()?, &actor)
        .await?;
    Ok(Json(
        json!({ "message": "Task updated successfully", "updatedTask": updated }),
    ))
}

pub(super) async fn delete<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task_id = parse_task_id(&id)?;
    state.tasks.delete(task_id, &actor).await?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

pub(super) async fn update_status<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task_id = parse_task_id(&id)?;
    let Json(body) = payload?;
    let task = state
        .tasks
        .update_status(task_id, body.status, &actor)
        .await?;
    Ok(Json(json!({ "message": "Task status updated", "task": task })))
}

pub(super) async fn update_checklist<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    payload: Result<Json<UpdateChecklistBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task_id = parse_task_id(&id)?;
    let Json(body) = payload?;
    let task = state
        .tasks
        .update_checklist(task_id, body.todo_checklist, &actor)
        .await?;
    Ok(Json(json!({ "message": "Task checklist updated", "task": task })))
}

pub(super) async fn add_remark<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    payload: Result<Json<RemarkBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let task_id = parse_task_id(&id)?;
    let Json(body) = payload?;
    let task = state.tasks.add_remark(task_id, body.text, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Remark added successfully", "task": task })),
    ))
}

pub(super) async fn dashboard<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
) -> Result<Json<Dashboard>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    Ok(Json(
        state.tasks.dashboard(DashboardScope::Global, &actor).await?,
    ))
}

pub(super) async fn user_dashboard<R, L, C>(
    State(state): State<AppState<R, L, C>>,
    Caller(actor): Caller,
) -> Result<Json<Dashboard>, ApiError>
where
    R: TaskRepository + 'static,
    L: TimeLogRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let scope = DashboardScope::User(actor.id());
    Ok(Json(state.tasks.dashboard(scope, &actor).await?))
}
