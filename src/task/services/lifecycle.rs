//! Orchestration service for the task lifecycle and history engine.

use crate::task::{
    domain::{
        HistoryAction, NewTaskData, Task, TaskDetail, TaskDomainError, TaskFilter, TaskFollower,
        TaskHistoryEntry, TaskId, TaskPatch, TaskPriority, TaskStatus, TaskTitle, TeamId, UserId,
    },
    ports::{
        FollowerRepository, FollowerRepositoryError, HistoryRepository, HistoryRepositoryError,
        TaskRepository, TaskRepositoryError,
    },
    services::access::{ensure_access, AccessDeniedError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    team_id: TeamId,
    parent_task_id: Option<TaskId>,
    assignee_id: Option<UserId>,
    follower_ids: Vec<UserId>,
    start_time: Option<DateTime<Utc>>,
    due_time: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// Creates a request with required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, team_id: TeamId) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
            priority: None,
            team_id,
            parent_task_id: None,
            assignee_id: None,
            follower_ids: Vec::new(),
            start_time: None,
            due_time: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an explicit initial status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets an explicit priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Marks the task as a subtask of `parent_task_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_task_id: TaskId) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Registers followers to add after creation.
    #[must_use]
    pub fn with_followers(mut self, follower_ids: impl IntoIterator<Item = UserId>) -> Self {
        self.follower_ids = follower_ids.into_iter().collect();
        self
    }

    /// Sets the scheduled start.
    #[must_use]
    pub const fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_time(mut self, due_time: DateTime<Utc>) -> Self {
        self.due_time = Some(due_time);
        self
    }
}

/// Service-level errors for task lifecycle operations.
///
/// Every failure is terminal for the request; the service never retries.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Input validation failed before any persistence.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The referenced parent task does not exist.
    #[error("parent task not found: {0}")]
    ParentNotFound(TaskId),

    /// The referenced follower record does not exist.
    #[error("user {user_id} does not follow task {task_id}")]
    FollowerNotFound {
        /// Task the removal targeted.
        task_id: TaskId,
        /// User the removal targeted.
        user_id: UserId,
    },

    /// The caller has no relationship granting access to the task.
    #[error(transparent)]
    AccessDenied(#[from] AccessDeniedError),

    /// The caller has access but lacks the required privilege.
    #[error("only the creator may delete task {0}")]
    ForbiddenOperation(TaskId),

    /// Task repository operation failed.
    #[error(transparent)]
    Tasks(#[from] TaskRepositoryError),

    /// Follower repository operation failed.
    #[error(transparent)]
    Followers(#[from] FollowerRepositoryError),

    /// History repository operation failed.
    #[error(transparent)]
    History(#[from] HistoryRepositoryError),
}

/// Result type for task lifecycle operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Sole writer of task and history state. Request-scoped and stateless
/// between calls; all durable state lives behind the repository ports.
pub struct TaskLifecycleService<T, F, H, C>
where
    T: TaskRepository,
    F: FollowerRepository,
    H: HistoryRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    followers: Arc<F>,
    history: Arc<H>,
    clock: Arc<C>,
}

impl<T, F, H, C> Clone for TaskLifecycleService<T, F, H, C>
where
    T: TaskRepository,
    F: FollowerRepository,
    H: HistoryRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            followers: Arc::clone(&self.followers),
            history: Arc::clone(&self.history),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> TaskLifecycleService<S, S, S, C>
where
    S: TaskRepository + FollowerRepository + HistoryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a service over one store implementing all three ports.
    #[must_use]
    pub fn with_store(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            tasks: Arc::clone(&store),
            followers: Arc::clone(&store),
            history: store,
            clock,
        }
    }
}

impl<T, F, H, C> TaskLifecycleService<T, F, H, C>
where
    T: TaskRepository,
    F: FollowerRepository,
    H: HistoryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(tasks: Arc<T>, followers: Arc<F>, history: Arc<H>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            followers,
            history,
            clock,
        }
    }

    /// Creates a task, records the `created` history entry, and registers
    /// any requested followers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Validation`] for an empty title,
    /// [`TaskLifecycleError::ParentNotFound`] for a dangling parent
    /// reference, or a repository error.
    pub async fn create(
        &self,
        request: CreateTaskRequest,
        creator_id: UserId,
    ) -> TaskLifecycleResult<TaskDetail> {
        let title = TaskTitle::new(request.title)?;

        if let Some(parent_id) = request.parent_task_id {
            let parent = self.tasks.find_by_id(parent_id).await?;
            if parent.is_none() {
                return Err(TaskLifecycleError::ParentNotFound(parent_id));
            }
        }

        let task = Task::new(
            NewTaskData {
                title,
                description: request.description,
                status: request.status,
                priority: request.priority,
                team_id: request.team_id,
                parent_task_id: request.parent_task_id,
                creator_id,
                assignee_id: request.assignee_id,
                start_time: request.start_time,
                due_time: request.due_time,
            },
            &*self.clock,
        );
        self.tasks.store(&task).await?;

        let entry = TaskHistoryEntry::new(task.id(), creator_id, HistoryAction::Created, &*self.clock)
            .with_changes(json!({ "task": task }));
        self.history.append(&entry).await?;

        if !request.follower_ids.is_empty() {
            self.add_followers(task.id(), &request.follower_ids, creator_id)
                .await?;
        }

        self.find_one(task.id(), creator_id).await
    }

    /// Loads a task with its parent, subtasks, and followers.
    ///
    /// This is the single read primitive; every other operation composes it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for an unknown id and
    /// [`TaskLifecycleError::AccessDenied`] when the caller is neither
    /// creator, assignee, nor follower.
    pub async fn find_one(&self, id: TaskId, user_id: UserId) -> TaskLifecycleResult<TaskDetail> {
        let detail = self.load_detail(id).await?;
        ensure_access(&detail, user_id)?;
        Ok(detail)
    }

    /// Lists top-level tasks where the caller is creator, assignee, or
    /// follower, narrowed and ordered by the filter.
    ///
    /// # Errors
    ///
    /// Returns a repository error when listing or hydration fails.
    pub async fn find_all(
        &self,
        user_id: UserId,
        filter: &TaskFilter,
    ) -> TaskLifecycleResult<Vec<TaskDetail>> {
        let tasks = self.tasks.find_top_level(user_id, filter).await?;
        let mut details = Vec::with_capacity(tasks.len());
        for task in tasks {
            details.push(self.load_detail(task.id()).await?);
        }
        Ok(details)
    }

    /// Applies a partial update, cascading parent completion and recording
    /// history entries for the change set.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`],
    /// [`TaskLifecycleError::AccessDenied`], or a repository error.
    pub async fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        user_id: UserId,
    ) -> TaskLifecycleResult<TaskDetail> {
        let detail = self.find_one(id, user_id).await?;
        let old_task = detail.task().clone();

        let mut task = old_task.clone();
        task.apply_patch(patch, &*self.clock);
        self.tasks.update(&task).await?;

        // Evaluate the cascade against freshly read parent and sibling state;
        // relations captured earlier in this request may already be stale.
        let completed_now = task.status() == TaskStatus::Completed
            && old_task.status() != TaskStatus::Completed;
        if completed_now {
            if let Some(parent_id) = task.parent_task_id() {
                self.check_and_complete_parent(parent_id).await?;
            }
        }

        let updated = TaskHistoryEntry::new(id, user_id, HistoryAction::Updated, &*self.clock)
            .with_changes(json!({ "old": old_task, "new": task }));
        self.history.append(&updated).await?;

        if patch
            .assignee_id
            .is_some_and(|assignee| Some(assignee) != old_task.assignee_id())
        {
            let entry =
                TaskHistoryEntry::new(id, user_id, HistoryAction::AssigneeChanged, &*self.clock)
                    .with_changes(json!({
                        "oldAssigneeId": old_task.assignee_id(),
                        "newAssigneeId": patch.assignee_id,
                    }));
            self.history.append(&entry).await?;
        }

        if patch.status.is_some_and(|status| status != old_task.status()) {
            let entry =
                TaskHistoryEntry::new(id, user_id, HistoryAction::StatusChanged, &*self.clock)
                    .with_changes(json!({
                        "oldStatus": old_task.status(),
                        "newStatus": task.status(),
                    }));
            self.history.append(&entry).await?;
        }

        self.find_one(id, user_id).await
    }

    /// Deletes a task. Only the creator may delete; followers, history, and
    /// subtask parent links are cascaded by the repository.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::ForbiddenOperation`] when the caller is
    /// not the creator, even if otherwise granted access.
    pub async fn remove(&self, id: TaskId, user_id: UserId) -> TaskLifecycleResult<()> {
        let detail = self.find_one(id, user_id).await?;
        if detail.task().creator_id() != user_id {
            return Err(TaskLifecycleError::ForbiddenOperation(id));
        }
        self.tasks.delete(id).await?;
        Ok(())
    }

    /// Registers followers on a task, one `follower_added` history entry per
    /// user actually added. Users already following are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`],
    /// [`TaskLifecycleError::AccessDenied`], or a repository error.
    pub async fn add_followers(
        &self,
        task_id: TaskId,
        user_ids: &[UserId],
        acting_user_id: UserId,
    ) -> TaskLifecycleResult<TaskDetail> {
        let detail = self.find_one(task_id, acting_user_id).await?;

        let mut seen: HashSet<UserId> = detail
            .followers()
            .iter()
            .map(TaskFollower::user_id)
            .collect();
        for &user_id in user_ids {
            if !seen.insert(user_id) {
                continue;
            }
            let follower = TaskFollower::new(task_id, user_id, &*self.clock);
            self.followers.add(&follower).await?;

            let entry = TaskHistoryEntry::new(
                task_id,
                acting_user_id,
                HistoryAction::FollowerAdded,
                &*self.clock,
            )
            .with_changes(json!({ "followerId": user_id }));
            self.history.append(&entry).await?;
        }

        self.find_one(task_id, acting_user_id).await
    }

    /// Removes a follower from a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::FollowerNotFound`] when the user does
    /// not follow the task.
    pub async fn remove_follower(
        &self,
        task_id: TaskId,
        follower_id: UserId,
        acting_user_id: UserId,
    ) -> TaskLifecycleResult<()> {
        self.find_one(task_id, acting_user_id).await?;

        let follower = self.followers.find(task_id, follower_id).await?;
        if follower.is_none() {
            return Err(TaskLifecycleError::FollowerNotFound {
                task_id,
                user_id: follower_id,
            });
        }
        self.followers.remove(task_id, follower_id).await?;
        Ok(())
    }

    /// Returns the history of a task and its direct subtasks, newest first.
    ///
    /// A parent's history view surfaces subtask activity so a user watching
    /// the parent sees child progress without navigating away.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`],
    /// [`TaskLifecycleError::AccessDenied`], or a repository error.
    pub async fn get_history(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskLifecycleResult<Vec<TaskHistoryEntry>> {
        let detail = self.find_one(task_id, user_id).await?;

        let mut task_ids = vec![task_id];
        task_ids.extend(detail.subtasks().iter().map(Task::id));
        Ok(self.history.list_for_tasks(&task_ids).await?)
    }

    /// Posts a comment and returns the refreshed history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Validation`] for an empty comment,
    /// [`TaskLifecycleError::NotFound`], or
    /// [`TaskLifecycleError::AccessDenied`].
    pub async fn add_comment(
        &self,
        task_id: TaskId,
        comment: impl Into<String> + Send,
        user_id: UserId,
    ) -> TaskLifecycleResult<Vec<TaskHistoryEntry>> {
        let text = comment.into();
        if text.trim().is_empty() {
            return Err(TaskDomainError::EmptyComment.into());
        }

        self.find_one(task_id, user_id).await?;

        let entry = TaskHistoryEntry::new(task_id, user_id, HistoryAction::Comment, &*self.clock)
            .with_comment(text);
        self.history.append(&entry).await?;

        self.get_history(task_id, user_id).await
    }

    /// Completes a parent task when every direct subtask has completed.
    ///
    /// Reads the parent and its subtasks fresh from storage so concurrent
    /// sibling completions are observed. The cascade is single-level: the
    /// parent's own parent is not re-evaluated. The `completed` entry is
    /// attributed to the parent's creator, not the triggering user.
    async fn check_and_complete_parent(&self, parent_id: TaskId) -> TaskLifecycleResult<()> {
        let Some(mut parent) = self.tasks.find_by_id(parent_id).await? else {
            return Ok(());
        };
        let subtasks = self.tasks.find_subtasks(parent_id).await?;
        if subtasks.is_empty() {
            return Ok(());
        }

        let all_completed = subtasks
            .iter()
            .all(|subtask| subtask.status() == TaskStatus::Completed);
        if !all_completed || parent.status() == TaskStatus::Completed {
            return Ok(());
        }

        parent.complete(&*self.clock);
        self.tasks.update(&parent).await?;

        let entry = TaskHistoryEntry::new(
            parent_id,
            parent.creator_id(),
            HistoryAction::Completed,
            &*self.clock,
        )
        .with_changes(json!({
            "autoCompleted": true,
            "reason": "all subtasks completed",
            "subtaskCount": subtasks.len(),
        }));
        self.history.append(&entry).await?;
        Ok(())
    }

    async fn load_detail(&self, id: TaskId) -> TaskLifecycleResult<TaskDetail> {
        let task = self
            .tasks
            .find_by_id(id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(id))?;
        let followers = self.followers.list_for_task(id).await?;
        let subtasks = self.tasks.find_subtasks(id).await?;
        let mut parent = None;
        if let Some(parent_id) = task.parent_task_id() {
            parent = self.tasks.find_by_id(parent_id).await?;
        }
        Ok(TaskDetail::new(task, parent, subtasks, followers))
    }
}
