//! Follower association between a task and a notified user.

use super::{TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Registration of a user's interest in activity on a task.
///
/// Distinct from the creator and assignee roles; at most one record should
/// exist per `(task, user)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFollower {
    task_id: TaskId,
    user_id: UserId,
    followed_at: DateTime<Utc>,
}

impl TaskFollower {
    /// Creates a follower record stamped with the current time.
    #[must_use]
    pub fn new(task_id: TaskId, user_id: UserId, clock: &impl Clock) -> Self {
        Self {
            task_id,
            user_id,
            followed_at: clock.utc(),
        }
    }

    /// Reconstructs a follower record from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        task_id: TaskId,
        user_id: UserId,
        followed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            user_id,
            followed_at,
        }
    }

    /// Returns the followed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the following user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns when the user started following.
    #[must_use]
    pub const fn followed_at(&self) -> DateTime<Utc> {
        self.followed_at
    }
}
