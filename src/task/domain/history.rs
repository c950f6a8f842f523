//! Append-only audit history for task activity.

use super::{HistoryEntryId, ParseHistoryActionError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of event recorded by a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Task was created.
    Created,
    /// Task fields were updated.
    Updated,
    /// Task reached completed status.
    Completed,
    /// Task was cancelled.
    Cancelled,
    /// Free-text comment was posted.
    Comment,
    /// Assignee changed.
    AssigneeChanged,
    /// Status changed.
    StatusChanged,
    /// A follower was added.
    FollowerAdded,
}

impl HistoryAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Comment => "comment",
            Self::AssigneeChanged => "assignee_changed",
            Self::StatusChanged => "status_changed",
            Self::FollowerAdded => "follower_added",
        }
    }
}

impl TryFrom<&str> for HistoryAction {
    type Error = ParseHistoryActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "comment" => Ok(Self::Comment),
            "assignee_changed" => Ok(Self::AssigneeChanged),
            "status_changed" => Ok(Self::StatusChanged),
            "follower_added" => Ok(Self::FollowerAdded),
            _ => Err(ParseHistoryActionError(value.to_owned())),
        }
    }
}

/// Immutable audit record of one event on a task.
///
/// Entries are only ever appended; nothing updates or deletes an individual
/// entry outside of the task delete cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHistoryEntry {
    id: HistoryEntryId,
    task_id: TaskId,
    user_id: UserId,
    action: HistoryAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedHistoryData {
    /// Persisted entry identifier.
    pub id: HistoryEntryId,
    /// Persisted owning task.
    pub task_id: TaskId,
    /// Persisted acting user.
    pub user_id: UserId,
    /// Persisted action kind.
    pub action: HistoryAction,
    /// Persisted structured diff payload.
    pub changes: Option<Value>,
    /// Persisted comment text.
    pub comment: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskHistoryEntry {
    /// Creates a history entry stamped with the current time.
    #[must_use]
    pub fn new(task_id: TaskId, user_id: UserId, action: HistoryAction, clock: &impl Clock) -> Self {
        Self {
            id: HistoryEntryId::new(),
            task_id,
            user_id,
            action,
            changes: None,
            comment: None,
            created_at: clock.utc(),
        }
    }

    /// Attaches a structured changes payload.
    #[must_use]
    pub fn with_changes(mut self, changes: Value) -> Self {
        self.changes = Some(changes);
        self
    }

    /// Attaches free-text comment content.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Reconstructs an entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedHistoryData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            user_id: data.user_id,
            action: data.action,
            changes: data.changes,
            comment: data.comment,
            created_at: data.created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> HistoryEntryId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the action kind.
    #[must_use]
    pub const fn action(&self) -> HistoryAction {
        self.action
    }

    /// Returns the structured changes payload, if any.
    #[must_use]
    pub const fn changes(&self) -> Option<&Value> {
        self.changes.as_ref()
    }

    /// Returns the comment text, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
