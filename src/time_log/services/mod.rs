//! Application services for time tracking.

mod tracker;

pub use tracker::{TimeTrackingError, TimeTrackingResult, TimeTrackingService};
