//! Orchestration services for the task domain.

mod access;
mod lifecycle;

pub use access::{can_access, ensure_access, AccessDeniedError};
pub use lifecycle::{
    CreateTaskRequest, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
};
