//! Taskboard: team task tracking core.
//!
//! This crate implements the task lifecycle and history engine for a
//! multi-user task tracker: task hierarchy with auto-completing parents,
//! follower registration, relationship-based access control, and an
//! append-only audit log of every mutation.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! Caller identity and team membership are external collaborators: the
//! service operates on resolved user and team identifiers and never
//! authenticates or re-checks membership itself.

pub mod task;
