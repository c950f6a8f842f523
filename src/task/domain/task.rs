//! Task aggregate root and related lifecycle types.

use super::{ParseTaskPriorityError, ParseTaskStatusError, TaskId, TaskTitle, TeamId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been created but work has not started.
    Pending,
    /// Task is being worked on.
    InProgress,
    /// Task has been completed.
    Completed,
    /// Task has been cancelled.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Task priority band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// Urgent priority.
    Urgent,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParseTaskPriorityError(value.to_owned())),
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    team_id: TeamId,
    parent_task_id: Option<TaskId>,
    creator_id: UserId,
    assignee_id: Option<UserId>,
    start_time: Option<DateTime<Utc>>,
    due_time: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for creating a new task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Validated task title.
    pub title: TaskTitle,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Initial status; defaults to [`TaskStatus::Pending`] when `None`.
    pub status: Option<TaskStatus>,
    /// Initial priority; defaults to [`TaskPriority::Medium`] when `None`.
    pub priority: Option<TaskPriority>,
    /// Owning team.
    pub team_id: TeamId,
    /// Optional parent task for subtask creation.
    pub parent_task_id: Option<TaskId>,
    /// Creating user; immutable for the task's lifetime.
    pub creator_id: UserId,
    /// Optional assignee.
    pub assignee_id: Option<UserId>,
    /// Optional scheduled start.
    pub start_time: Option<DateTime<Utc>>,
    /// Optional due date.
    pub due_time: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted owning team.
    pub team_id: TeamId,
    /// Persisted parent task reference.
    pub parent_task_id: Option<TaskId>,
    /// Persisted creator.
    pub creator_id: UserId,
    /// Persisted assignee.
    pub assignee_id: Option<UserId>,
    /// Persisted scheduled start.
    pub start_time: Option<DateTime<Utc>>,
    /// Persisted due date.
    pub due_time: Option<DateTime<Utc>>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial field set applied over an existing task.
///
/// Absent fields leave the current value untouched. `description` and
/// `assignee_id` can be set but not cleared, matching the patch semantics of
/// the update operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<TaskTitle>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement status.
    pub status: Option<TaskStatus>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
    /// Replacement owning team.
    pub team_id: Option<TeamId>,
    /// Replacement parent task reference.
    pub parent_task_id: Option<TaskId>,
    /// Replacement assignee.
    pub assignee_id: Option<UserId>,
    /// Replacement scheduled start.
    pub start_time: Option<DateTime<Utc>>,
    /// Replacement due date.
    pub due_time: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the replacement title.
    #[must_use]
    pub fn with_title(mut self, title: TaskTitle) -> Self {
        self.title = Some(title);
        self
    }

    /// Sets the replacement description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the replacement status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the replacement priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the replacement assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Sets the replacement due date.
    #[must_use]
    pub const fn with_due_time(mut self, due_time: DateTime<Utc>) -> Self {
        self.due_time = Some(due_time);
        self
    }

    /// Sets the replacement scheduled start.
    #[must_use]
    pub const fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

impl Task {
    /// Creates a new task with defaulted status and priority.
    #[must_use]
    pub fn new(data: NewTaskData, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: data.title,
            description: data.description,
            status: data.status.unwrap_or(TaskStatus::Pending),
            priority: data.priority.unwrap_or(TaskPriority::Medium),
            team_id: data.team_id,
            parent_task_id: data.parent_task_id,
            creator_id: data.creator_id,
            assignee_id: data.assignee_id,
            start_time: data.start_time,
            due_time: data.due_time,
            completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            team_id: data.team_id,
            parent_task_id: data.parent_task_id,
            creator_id: data.creator_id,
            assignee_id: data.assignee_id,
            start_time: data.start_time,
            due_time: data.due_time,
            completed_at: data.completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the task priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the owning team identifier.
    #[must_use]
    pub const fn team_id(&self) -> TeamId {
        self.team_id
    }

    /// Returns the parent task identifier, if this task is a subtask.
    #[must_use]
    pub const fn parent_task_id(&self) -> Option<TaskId> {
        self.parent_task_id
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn creator_id(&self) -> UserId {
        self.creator_id
    }

    /// Returns the assigned user, if any.
    #[must_use]
    pub const fn assignee_id(&self) -> Option<UserId> {
        self.assignee_id
    }

    /// Returns the scheduled start, if any.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_time(&self) -> Option<DateTime<Utc>> {
        self.due_time
    }

    /// Returns the completion timestamp, if the task has ever been completed.
    ///
    /// The timestamp records the moment of the transition into
    /// [`TaskStatus::Completed`] and is never cleared by later status changes.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial update over this task.
    ///
    /// Bumps `updated_at`, and stamps `completed_at` when the patch moves the
    /// status onto [`TaskStatus::Completed`] from any other status.
    pub fn apply_patch(&mut self, patch: &TaskPatch, clock: &impl Clock) {
        let previous_status = self.status;

        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(team_id) = patch.team_id {
            self.team_id = team_id;
        }
        if let Some(parent_task_id) = patch.parent_task_id {
            self.parent_task_id = Some(parent_task_id);
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.assignee_id = Some(assignee_id);
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = Some(start_time);
        }
        if let Some(due_time) = patch.due_time {
            self.due_time = Some(due_time);
        }

        let timestamp = clock.utc();
        if self.status == TaskStatus::Completed && previous_status != TaskStatus::Completed {
            self.completed_at = Some(timestamp);
        }
        self.updated_at = timestamp;
    }

    /// Clears the parent link, promoting this subtask to a top-level task.
    ///
    /// Used by the delete cascade when a parent task is removed.
    pub const fn detach_from_parent(&mut self) {
        self.parent_task_id = None;
    }

    /// Transitions the task to completed, stamping `completed_at`.
    ///
    /// Used by the parent-completion cascade; a no-op guard is the caller's
    /// responsibility.
    pub fn complete(&mut self, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.status = TaskStatus::Completed;
        self.completed_at = Some(timestamp);
        self.updated_at = timestamp;
    }
}
