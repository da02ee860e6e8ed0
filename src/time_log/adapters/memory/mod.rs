//! In-memory adapters for time-tracking ports.

mod time_log;

pub use time_log::InMemoryTimeLogRepository;
