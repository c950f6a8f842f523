//! Task lifecycle and history engine.
//!
//! Implements multi-user task tracking with subtask hierarchy, followers,
//! and an append-only audit trail: relationship-based access checks, partial
//! updates with status-transition detection, parent-completion cascades, and
//! per-mutation history entries. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
