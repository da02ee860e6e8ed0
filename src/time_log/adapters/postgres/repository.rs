//! `PostgreSQL` repository implementation for time-log storage.

use super::{
    models::{NewTimeLogRow, TimeLogRow},
    schema::time_logs,
};
use crate::db::{PgPool, run_blocking_with};
use crate::identity::UserId;
use crate::task::domain::TaskId;
use crate::time_log::{
    domain::{PersistedTimeLogData, TimeLog, TimeLogId},
    ports::{TimeLogRepository, TimeLogRepositoryError, TimeLogRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Partial unique index enforcing one running session per task and user.
const ACTIVE_TIMER_INDEX: &str = "idx_time_logs_active_unique";

/// `PostgreSQL`-backed time-log repository.
///
/// The active-timer rule is enforced by a partial unique index, and stops
/// are conditional updates on `end_time IS NULL`.
#[derive(Debug, Clone)]
pub struct PostgresTimeLogRepository {
    pool: PgPool,
}

impl PostgresTimeLogRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TimeLogRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TimeLogRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking_with(&self.pool, f, TimeLogRepositoryError::persistence).await
    }
}

#[async_trait]
impl TimeLogRepository for PostgresTimeLogRepository {
    async fn start(&self, time_log: &TimeLog) -> TimeLogRepositoryResult<()> {
        let (id, task_id, user_id) = (time_log.id(), time_log.task_id(), time_log.user_id());
        let new_row = to_new_row(time_log);

        self.run_blocking(move |connection| {
            diesel::insert_into(time_logs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.constraint_name() == Some(ACTIVE_TIMER_INDEX) =>
                    {
                        TimeLogRepositoryError::ActiveTimerExists { task_id, user_id }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TimeLogRepositoryError::DuplicateTimeLog(id)
                    }
                    _ => TimeLogRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn stop(&self, time_log: &TimeLog) -> TimeLogRepositoryResult<()> {
        let id = time_log.id();
        let end_time = time_log.end_time();
        let duration_ms = time_log.duration_ms();

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                time_logs::table
                    .filter(time_logs::id.eq(id.into_inner()))
                    .filter(time_logs::end_time.is_null()),
            )
            .set((
                time_logs::end_time.eq(end_time),
                time_logs::duration_ms.eq(duration_ms),
            ))
            .execute(connection)
            .map_err(TimeLogRepositoryError::persistence)?;
            if updated > 0 {
                return Ok(());
            }

            let exists = diesel::select(diesel::dsl::exists(
                time_logs::table.filter(time_logs::id.eq(id.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(TimeLogRepositoryError::persistence)?;
            if exists {
                Err(TimeLogRepositoryError::AlreadyStopped(id))
            } else {
                Err(TimeLogRepositoryError::NotFound(id))
            }
        })
        .await
    }

    async fn find_by_id(&self, id: TimeLogId) -> TimeLogRepositoryResult<Option<TimeLog>> {
        self.run_blocking(move |connection| {
            let row = time_logs::table
                .filter(time_logs::id.eq(id.into_inner()))
                .select(TimeLogRow::as_select())
                .first::<TimeLogRow>(connection)
                .optional()
                .map_err(TimeLogRepositoryError::persistence)?;
            Ok(row.map(row_to_time_log))
        })
        .await
    }

    async fn find_active(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TimeLogRepositoryResult<Option<TimeLog>> {
        self.run_blocking(move |connection| {
            let row = time_logs::table
                .filter(time_logs::task_id.eq(task_id.into_inner()))
                .filter(time_logs::user_id.eq(user_id.into_inner()))
                .filter(time_logs::end_time.is_null())
                .select(TimeLogRow::as_select())
                .first::<TimeLogRow>(connection)
                .optional()
                .map_err(TimeLogRepositoryError::persistence)?;
            Ok(row.map(row_to_time_log))
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> TimeLogRepositoryResult<Vec<TimeLog>> {
        self.run_blocking(move |connection| {
            let rows = time_logs::table
                .filter(time_logs::task_id.eq(task_id.into_inner()))
                .order((time_logs::start_time.desc(), time_logs::id.asc()))
                .select(TimeLogRow::as_select())
                .load::<TimeLogRow>(connection)
                .map_err(TimeLogRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_time_log).collect())
        })
        .await
    }
}

fn to_new_row(time_log: &TimeLog) -> NewTimeLogRow {
    NewTimeLogRow {
        id: time_log.id().into_inner(),
        task_id: time_log.task_id().into_inner(),
        user_id: time_log.user_id().into_inner(),
        start_time: time_log.start_time(),
        end_time: time_log.end_time(),
        duration_ms: time_log.duration_ms(),
        created_at: time_log.created_at(),
    }
}

fn row_to_time_log(row: TimeLogRow) -> TimeLog {
    TimeLog::from_persisted(PersistedTimeLogData {
        id: TimeLogId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        user_id: UserId::from_uuid(row.user_id),
        start_time: row.start_time,
        end_time: row.end_time,
        duration_ms: row.duration_ms,
        created_at: row.created_at,
    })
}
