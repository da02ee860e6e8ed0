//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{NewTaskRow, TaskChangeset, TaskRow},
    schema::tasks,
};
use crate::db::{PgPool, run_blocking_with};
use crate::identity::UserId;
use crate::task::{
    domain::{
        Assignees, ChecklistItem, PersistedTaskData, Progress, Remark, Task, TaskId,
        TaskPriority, TaskStatus, TaskTitle,
    },
    ports::{TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking_with(&self.pool, f, TaskRepositoryError::persistence).await
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_new_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task, expected_revision: u64) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let changeset = to_changeset(task)?;
        let expected = to_column_revision(expected_revision)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .filter(tasks::revision.eq(expected)),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            if updated > 0 {
                return Ok(());
            }
            let exists = diesel::select(diesel::dsl::exists(
                tasks::table.filter(tasks::id.eq(task_id.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(TaskRepositoryError::persistence)?;
            if exists {
                Err(TaskRepositoryError::StaleTask(task_id))
            } else {
                Err(TaskRepositoryError::NotFound(task_id))
            }
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>> {
        let lookup = *query;
        self.run_blocking(move |connection| {
            let mut statement = tasks::table.select(TaskRow::as_select()).into_boxed();
            if let Some(user) = lookup.assignee() {
                statement = statement.filter(tasks::assigned_to.contains(vec![user.into_inner()]));
            }
            if let Some(status) = lookup.status() {
                statement = statement.filter(tasks::status.eq(status.as_str()));
            }
            let rows = statement
                .order((tasks::created_at.desc(), tasks::id.asc()))
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

fn to_new_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    let changeset = to_changeset(task)?;
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        title: changeset.title,
        description: changeset.description,
        priority: changeset.priority,
        status: changeset.status,
        due_date: changeset.due_date,
        created_by: task.created_by().into_inner(),
        assigned_to: changeset.assigned_to,
        attachments: changeset.attachments,
        todo_checklist: changeset.todo_checklist,
        progress: changeset.progress,
        remarks: changeset.remarks,
        created_at: task.created_at(),
        updated_at: changeset.updated_at,
        revision: changeset.revision,
    })
}

fn to_changeset(task: &Task) -> TaskRepositoryResult<TaskChangeset> {
    let attachments =
        serde_json::to_value(task.attachments()).map_err(TaskRepositoryError::persistence)?;
    let todo_checklist =
        serde_json::to_value(task.todo_checklist()).map_err(TaskRepositoryError::persistence)?;
    let remarks = serde_json::to_value(task.remarks()).map_err(TaskRepositoryError::persistence)?;

    Ok(TaskChangeset {
        title: task.title().as_str().to_owned(),
        description: task.description().to_owned(),
        priority: task.priority().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        due_date: task.due_date(),
        assigned_to: task
            .assigned_to()
            .as_slice()
            .iter()
            .map(|user| user.into_inner())
            .collect(),
        attachments,
        todo_checklist,
        progress: i16::from(task.progress().value()),
        remarks,
        updated_at: task.updated_at(),
        revision: to_column_revision(task.revision())?,
    })
}

fn to_column_revision(revision: u64) -> TaskRepositoryResult<i64> {
    i64::try_from(revision).map_err(TaskRepositoryError::persistence)
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        priority: persisted_priority,
        status: persisted_status,
        due_date,
        created_by,
        assigned_to,
        attachments: persisted_attachments,
        todo_checklist: persisted_checklist,
        progress: persisted_progress,
        remarks: persisted_remarks,
        created_at,
        updated_at,
        revision: persisted_revision,
    } = row;

    let status = TaskStatus::try_from(persisted_status.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    let priority = TaskPriority::try_from(persisted_priority.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    let progress =
        Progress::new(i64::from(persisted_progress)).map_err(TaskRepositoryError::persistence)?;
    let attachments = serde_json::from_value::<Vec<String>>(persisted_attachments)
        .map_err(TaskRepositoryError::persistence)?;
    let todo_checklist = serde_json::from_value::<Vec<ChecklistItem>>(persisted_checklist)
        .map_err(TaskRepositoryError::persistence)?;
    let remarks = serde_json::from_value::<Vec<Remark>>(persisted_remarks)
        .map_err(TaskRepositoryError::persistence)?;
    let revision = u64::try_from(persisted_revision).map_err(TaskRepositoryError::persistence)?;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        title: TaskTitle::new(title).map_err(TaskRepositoryError::persistence)?,
        description,
        priority,
        status,
        due_date,
        created_by: UserId::from_uuid(created_by),
        assigned_to: assigned_to.into_iter().map(UserId::from_uuid).collect::<Assignees>(),
        attachments,
        todo_checklist,
        progress,
        remarks,
        created_at,
        updated_at,
        revision,
    };
    Ok(Task::from_persisted(data))
}
