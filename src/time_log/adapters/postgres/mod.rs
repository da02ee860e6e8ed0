//! `PostgreSQL` adapters for time-tracking ports.

mod models;
mod repository;
mod schema;

pub use repository::PostgresTimeLogRepository;
