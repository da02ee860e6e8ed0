//! Shared fixtures for `PostgreSQL` integration tests.

pub use super::cluster::BoxError;
use super::cluster::{PostgresCluster, postgres_cluster};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use taskboard::db::{apply_migrations, build_pool};
use taskboard::task::{
    adapters::postgres::PostgresTaskRepository, services::TaskLifecycleService,
};
use taskboard::time_log::{
    adapters::postgres::PostgresTimeLogRepository, services::TimeTrackingService,
};
use uuid::Uuid;

/// Template database holding the migrated schema.
pub const TEMPLATE_DB: &str = "taskboard_test_template";

/// Connections per test database; enough for the concurrency tests to race.
pub const POOL_SIZE: u32 = 8;

/// Task service over `PostgreSQL` storage.
pub type PgTasks = TaskLifecycleService<PostgresTaskRepository, DefaultClock>;

/// Time-tracking service over `PostgreSQL` storage.
pub type PgTracker =
    TimeTrackingService<PostgresTaskRepository, PostgresTimeLogRepository, DefaultClock>;

/// Database cloned from the template, dropped with the guard.
pub struct TestDatabase {
    cluster: PostgresCluster,
    name: String,
}

impl TestDatabase {
    fn create(cluster: PostgresCluster) -> Result<Self, BoxError> {
        let name = format!("taskboard_test_{}", Uuid::new_v4().simple());
        cluster.clone_template(&name, TEMPLATE_DB)?;
        Ok(Self { cluster, name })
    }

    /// Returns the database connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        self.cluster.database_url(&self.name)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(&self.name) {
            eprintln!("failed to drop test database {}: {err}", self.name);
        }
    }
}

/// Repositories and services over a fresh database.
///
/// Fields drop in order, so the pool owners go before the database guard.
pub struct PgContext {
    pub tasks: Arc<PostgresTaskRepository>,
    pub time_logs: Arc<PostgresTimeLogRepository>,
    pub task_service: PgTasks,
    pub tracker: PgTracker,
    _database: TestDatabase,
}

fn migrate_template(url: &str) -> Result<(), BoxError> {
    let pool = build_pool(url, 1)?;
    apply_migrations(&pool)?;
    Ok(())
}

fn prepare() -> Result<PgContext, BoxError> {
    let cluster = postgres_cluster()?;
    cluster.ensure_template(TEMPLATE_DB, migrate_template)?;
    let database = TestDatabase::create(cluster)?;
    let pool = build_pool(&database.url(), POOL_SIZE)?;
    let tasks = Arc::new(PostgresTaskRepository::new(pool.clone()));
    let time_logs = Arc::new(PostgresTimeLogRepository::new(pool));
    let clock = Arc::new(DefaultClock);
    Ok(PgContext {
        task_service: TaskLifecycleService::new(Arc::clone(&tasks), Arc::clone(&clock)),
        tracker: TimeTrackingService::new(Arc::clone(&tasks), Arc::clone(&time_logs), clock),
        tasks,
        time_logs,
        _database: database,
    })
}

/// Provides repositories over a freshly cloned database.
#[fixture]
pub async fn pg() -> Result<PgContext, BoxError> {
    tokio::task::spawn_blocking(prepare)
        .await
        .map_err(|err| Box::new(err) as BoxError)?
}
