//! Per-user timers on tasks.
//!
//! Users start and stop work sessions against tasks they are assigned to;
//! administrators may track time on any task. The repository guarantees at
//! most one running session per task and user, even when starts race.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
