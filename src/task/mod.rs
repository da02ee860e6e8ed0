//! Task lifecycle management.
//!
//! Administrators create tasks and assign them to members; assigned members
//! and administrators advance them by updating checklists or setting the
//! status directly. Checklist writes always re-derive the stored progress
//! and status. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
