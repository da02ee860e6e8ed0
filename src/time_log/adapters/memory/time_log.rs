//! In-memory repository for time logs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::UserId;
use crate::task::domain::TaskId;
use crate::time_log::{
    domain::{TimeLog, TimeLogId},
    ports::{TimeLogRepository, TimeLogRepositoryError, TimeLogRepositoryResult},
};

/// Thread-safe in-memory time-log repository.
///
/// The active-timer check and the insert happen under one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTimeLogRepository {
    state: Arc<RwLock<HashMap<TimeLogId, TimeLog>>>,
}

impl InMemoryTimeLogRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TimeLogRepositoryResult<RwLockReadGuard<'_, HashMap<TimeLogId, TimeLog>>> {
        self.state.read().map_err(|err| {
            TimeLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> TimeLogRepositoryResult<RwLockWriteGuard<'_, HashMap<TimeLogId, TimeLog>>> {
        self.state.write().map_err(|err| {
            TimeLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn is_active_for(time_log: &TimeLog, task_id: TaskId, user_id: UserId) -> bool {
    time_log.is_active() && time_log.task_id() == task_id && time_log.user_id() == user_id
}

#[async_trait]
impl TimeLogRepository for InMemoryTimeLogRepository {
    async fn start(&self, time_log: &TimeLog) -> TimeLogRepositoryResult<()> {
        let mut logs = self.write()?;
        if logs.contains_key(&time_log.id()) {
            return Err(TimeLogRepositoryError::DuplicateTimeLog(time_log.id()));
        }
        let (task_id, user_id) = (time_log.task_id(), time_log.user_id());
        if logs.values().any(|log| is_active_for(log, task_id, user_id)) {
            return Err(TimeLogRepositoryError::ActiveTimerExists { task_id, user_id });
        }
        logs.insert(time_log.id(), time_log.clone());
        Ok(())
    }

    async fn stop(&self, time_log: &TimeLog) -> TimeLogRepositoryResult<()> {
        let mut logs = self.write()?;
        let stored = logs
            .get_mut(&time_log.id())
            .ok_or(TimeLogRepositoryError::NotFound(time_log.id()))?;
        if !stored.is_active() {
            return Err(TimeLogRepositoryError::AlreadyStopped(time_log.id()));
        }
        *stored = time_log.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TimeLogId) -> TimeLogRepositoryResult<Option<TimeLog>> {
        let logs = self.read()?;
        Ok(logs.get(&id).cloned())
    }

    async fn find_active(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TimeLogRepositoryResult<Option<TimeLog>> {
        let logs = self.read()?;
        Ok(logs
            .values()
            .find(|log| is_active_for(log, task_id, user_id))
            .cloned())
    }

    async fn list_for_task(&self, task_id: TaskId) -> TimeLogRepositoryResult<Vec<TimeLog>> {
        let logs = self.read()?;
        let mut matching: Vec<TimeLog> = logs
            .values()
            .filter(|log| log.task_id() == task_id)
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            right
                .start_time()
                .cmp(&left.start_time())
                .then_with(|| left.id().into_inner().cmp(&right.id().into_inner()))
        });
        Ok(matching)
    }
}
