//! Hydrated read model for a task and its relations.

use super::{Task, TaskFollower, UserId};
use serde::{Deserialize, Serialize};

/// A task together with its parent, direct subtasks, and followers.
///
/// Relationships are resolved by id lookup at read time; the detail view
/// never embeds a recursive object graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<Task>,
    subtasks: Vec<Task>,
    followers: Vec<TaskFollower>,
}

impl TaskDetail {
    /// Assembles a detail view from freshly loaded relations.
    #[must_use]
    pub const fn new(
        task: Task,
        parent: Option<Task>,
        subtasks: Vec<Task>,
        followers: Vec<TaskFollower>,
    ) -> Self {
        Self {
            task,
            parent,
            subtasks,
            followers,
        }
    }

    /// Returns the task record.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the parent task, when this task is a subtask.
    #[must_use]
    pub const fn parent(&self) -> Option<&Task> {
        self.parent.as_ref()
    }

    /// Returns the direct subtasks.
    #[must_use]
    pub fn subtasks(&self) -> &[Task] {
        &self.subtasks
    }

    /// Returns the follower records.
    #[must_use]
    pub fn followers(&self) -> &[TaskFollower] {
        &self.followers
    }

    /// Returns whether the user follows this task.
    #[must_use]
    pub fn is_followed_by(&self, user_id: UserId) -> bool {
        self.followers
            .iter()
            .any(|follower| follower.user_id() == user_id)
    }
}
