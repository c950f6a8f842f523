//! Repository ports for task, follower, and history persistence.

use crate::task::domain::{Task, TaskFilter, TaskFollower, TaskHistoryEntry, TaskId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Result type for follower repository operations.
pub type FollowerRepositoryResult<T> = Result<T, FollowerRepositoryError>;

/// Result type for history repository operations.
pub type HistoryRepositoryResult<T> = Result<T, HistoryRepositoryError>;

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Deletes a task, cascading its follower and history records and
    /// detaching its direct subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the direct subtasks of the given task, read fresh from
    /// storage.
    async fn find_subtasks(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns top-level tasks (no parent) where the user is creator,
    /// assignee, or follower, narrowed and ordered by the filter.
    async fn find_top_level(
        &self,
        user_id: UserId,
        filter: &TaskFilter,
    ) -> TaskRepositoryResult<Vec<Task>>;
}

/// Follower persistence contract.
#[async_trait]
pub trait FollowerRepository: Send + Sync {
    /// Stores a follower record.
    async fn add(&self, follower: &TaskFollower) -> FollowerRepositoryResult<()>;

    /// Finds the follower record for `(task, user)`.
    ///
    /// Returns `None` when the user does not follow the task.
    async fn find(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> FollowerRepositoryResult<Option<TaskFollower>>;

    /// Removes the follower record for `(task, user)`.
    ///
    /// # Errors
    ///
    /// Returns [`FollowerRepositoryError::NotFound`] when no record exists.
    async fn remove(&self, task_id: TaskId, user_id: UserId) -> FollowerRepositoryResult<()>;

    /// Returns all follower records for the task.
    async fn list_for_task(&self, task_id: TaskId) -> FollowerRepositoryResult<Vec<TaskFollower>>;
}

/// History persistence contract. Entries are append-only.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Appends an entry to the history log.
    async fn append(&self, entry: &TaskHistoryEntry) -> HistoryRepositoryResult<()>;

    /// Returns every entry whose task is in `task_ids`, ordered by creation
    /// time descending.
    async fn list_for_tasks(
        &self,
        task_ids: &[TaskId],
    ) -> HistoryRepositoryResult<Vec<TaskHistoryEntry>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Errors returned by follower repository implementations.
#[derive(Debug, Clone, Error)]
pub enum FollowerRepositoryError {
    /// No follower record exists for the pair.
    #[error("user {user_id} does not follow task {task_id}")]
    NotFound {
        /// Task the lookup targeted.
        task_id: TaskId,
        /// User the lookup targeted.
        user_id: UserId,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FollowerRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Errors returned by history repository implementations.
#[derive(Debug, Clone, Error)]
pub enum HistoryRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl HistoryRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
