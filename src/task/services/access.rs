//! Relationship-based access checks for task operations.

use crate::task::domain::{TaskDetail, TaskId, UserId};
use thiserror::Error;

/// Rejection raised when a caller has no relationship to a task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("access denied to task {task_id} for user {user_id}")]
pub struct AccessDeniedError {
    /// The task the caller tried to reach.
    pub task_id: TaskId,
    /// The rejected caller.
    pub user_id: UserId,
}

/// Returns whether the user may read or mutate the task.
///
/// Access is granted to the creator, the assignee, and any follower.
#[must_use]
pub fn can_access(detail: &TaskDetail, user_id: UserId) -> bool {
    let task = detail.task();
    task.creator_id() == user_id
        || task.assignee_id() == Some(user_id)
        || detail.is_followed_by(user_id)
}

/// Gates an operation on task access.
///
/// # Errors
///
/// Returns [`AccessDeniedError`] when the user is neither creator, assignee,
/// nor follower. Denial is always explicit; callers never silently filter.
pub fn ensure_access(detail: &TaskDetail, user_id: UserId) -> Result<(), AccessDeniedError> {
    if can_access(detail, user_id) {
        return Ok(());
    }
    Err(AccessDeniedError {
        task_id: detail.task().id(),
        user_id,
    })
}
