//! Adapter implementations for time-tracking ports.

pub mod memory;
pub mod postgres;
