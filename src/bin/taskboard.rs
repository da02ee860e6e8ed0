//! Task board HTTP server.
//!
//! Usage: `taskboard [CONFIG_PATH]`. Without a path, `TASKBOARD_CONFIG` is
//! consulted and built-in defaults apply when neither is set.

use mockable::DefaultClock;
use std::path::PathBuf;
use std::sync::Arc;
use taskboard::config::{AppConfig, StorageBackend};
use taskboard::db::{apply_migrations, build_pool};
use taskboard::http::{AppState, router};
use taskboard::task::adapters::memory::InMemoryTaskRepository;
use taskboard::task::adapters::postgres::PostgresTaskRepository;
use taskboard::telemetry::init_tracing;
use taskboard::time_log::adapters::memory::InMemoryTimeLogRepository;
use taskboard::time_log::adapters::postgres::PostgresTimeLogRepository;
use thiserror::Error;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum StartupError {
    #[error("storage backend `postgres` requires `storage.database_url`")]
    MissingDatabaseUrl,
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load(std::env::args_os().nth(1).map(PathBuf::from))?;
    init_tracing(&config.telemetry)?;

    let app = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on shutdown");
            router(AppState::new(
                Arc::new(InMemoryTaskRepository::new()),
                Arc::new(InMemoryTimeLogRepository::new()),
                Arc::new(DefaultClock),
            ))
        }
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .as_deref()
                .ok_or(StartupError::MissingDatabaseUrl)?;
            let pool = build_pool(url, config.storage.max_connections)?;
            let migration_pool = pool.clone();
            tokio::task::spawn_blocking(move || apply_migrations(&migration_pool)).await??;
            router(AppState::new(
                Arc::new(PostgresTaskRepository::new(pool.clone())),
                Arc::new(PostgresTimeLogRepository::new(pool)),
                Arc::new(DefaultClock),
            ))
        }
    };

    let address = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    tracing::info!(%address, backend = ?config.storage.backend, "taskboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("taskboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
