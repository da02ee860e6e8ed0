//! Taskboard: task tracking with checklist-driven progress and per-user
//! time logs.
//!
//! Administrators create tasks and assign them to members. Members move
//! tasks forward by ticking checklist items, which re-derives progress and
//! status, and log time against them with start/stop timers.
//!
//! # Architecture
//!
//! Each feature module follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Authorization and orchestration over the ports
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle, checklist progress and dashboards
//! - [`time_log`]: Per-user timers on tasks
//! - [`http`]: JSON API over both services
//! - [`config`], [`telemetry`], [`db`]: Process wiring

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod identity;
pub mod task;
pub mod telemetry;
pub mod time_log;
