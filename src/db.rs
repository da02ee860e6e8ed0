//! Shared `PostgreSQL` plumbing for the Diesel adapters.
//!
//! Provides the pool type, schema bootstrap from the bundled migrations, and
//! a helper that offloads synchronous Diesel work onto Tokio's blocking
//! thread pool.

use diesel::PgConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use std::io;
use thiserror::Error;

/// `PostgreSQL` connection pool type.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: [(&str, &str); 2] = [
    (
        "2026-10-01-000000_create_tasks",
        include_str!("../migrations/2026-10-01-000000_create_tasks/up.sql"),
    ),
    (
        "2026-10-01-000001_create_time_logs",
        include_str!("../migrations/2026-10-01-000001_create_time_logs/up.sql"),
    ),
];

/// Errors raised while preparing the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The connection pool could not be built or a connection checked out.
    #[error("database pool error: {0}")]
    Pool(#[from] PoolError),

    /// A migration script failed.
    #[error("migration {name} failed: {source}")]
    Migration {
        /// Migration directory name.
        name: &'static str,
        /// Underlying Diesel error.
        #[source]
        source: diesel::result::Error,
    },
}

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`DatabaseError::Pool`] when the initial connections cannot be
/// established.
pub fn build_pool(database_url: &str, max_connections: u32) -> Result<PgPool, DatabaseError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Ok(Pool::builder().max_size(max_connections).build(manager)?)
}

/// Applies the bundled schema migrations in order.
///
/// The scripts only create missing objects, so re-running them against an
/// initialised database is harmless.
///
/// # Errors
///
/// Returns [`DatabaseError`] when a connection cannot be obtained or a
/// script fails.
pub fn apply_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut connection = pool.get()?;
    for (name, sql) in MIGRATIONS {
        connection
            .batch_execute(sql)
            .map_err(|source| DatabaseError::Migration { name, source })?;
        tracing::info!(migration = name, "applied schema migration");
    }
    Ok(())
}

/// Runs `f` with a pooled connection on the blocking thread pool.
///
/// `map_err` converts pool and join failures into the caller's error type.
pub(crate) async fn run_blocking_with<F, T, E, M>(pool: &PgPool, f: F, map_err: M) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    M: Fn(io::Error) -> E + Send + Copy + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(|err| map_err(io::Error::other(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| map_err(io::Error::other(err)))?
}
