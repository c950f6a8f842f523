//! In-memory persistence for task lifecycle tests.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{
        SortField, SortOrder, Task, TaskFilter, TaskFollower, TaskHistoryEntry, TaskId, UserId,
    },
    ports::{
        FollowerRepository, FollowerRepositoryError, FollowerRepositoryResult, HistoryRepository,
        HistoryRepositoryError, HistoryRepositoryResult, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};

/// Thread-safe in-memory store backing all three repository ports.
///
/// Tasks, followers, and history share one state block so the delete cascade
/// can run atomically under a single write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    tasks: HashMap<TaskId, Task>,
    followers: HashMap<TaskId, Vec<TaskFollower>>,
    history: Vec<TaskHistoryEntry>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, InMemoryState>, std::io::Error> {
        self.state
            .read()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }

    fn write_state(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, InMemoryState>, std::io::Error> {
        self.state
            .write()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }
}

fn follows(state: &InMemoryState, task_id: TaskId, user_id: UserId) -> bool {
    state
        .followers
        .get(&task_id)
        .is_some_and(|list| list.iter().any(|f| f.user_id() == user_id))
}

fn matches_filter(task: &Task, filter: &TaskFilter) -> bool {
    if filter.team_id.is_some_and(|team| team != task.team_id()) {
        return false;
    }
    if filter.status.is_some_and(|status| status != task.status()) {
        return false;
    }
    if filter
        .creator_id
        .is_some_and(|creator| creator != task.creator_id())
    {
        return false;
    }
    if filter
        .assignee_id
        .is_some_and(|assignee| Some(assignee) != task.assignee_id())
    {
        return false;
    }
    if filter
        .created
        .is_some_and(|range| !range.contains(task.created_at()))
    {
        return false;
    }
    true
}

/// Compares two tasks for the given sort field and direction.
///
/// Tasks without a due date sort after dated tasks under both directions.
fn compare_tasks(a: &Task, b: &Task, field: SortField, order: SortOrder) -> Ordering {
    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    match field {
        SortField::CreatedAt => directed(a.created_at().cmp(&b.created_at())),
        SortField::CreatorId => {
            directed(a.creator_id().into_inner().cmp(&b.creator_id().into_inner()))
        }
        SortField::Id => directed(a.id().into_inner().cmp(&b.id().into_inner())),
        SortField::DueTime => match (a.due_time(), b.due_time()) {
            (Some(left), Some(right)) => directed(left.cmp(&right)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self
            .write_state()
            .map_err(TaskRepositoryError::persistence)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self
            .write_state()
            .map_err(TaskRepositoryError::persistence)?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self
            .write_state()
            .map_err(TaskRepositoryError::persistence)?;
        if state.tasks.remove(&id).is_none() {
            return Err(TaskRepositoryError::NotFound(id));
        }
        state.followers.remove(&id);
        state.history.retain(|entry| entry.task_id() != id);
        for task in state.tasks.values_mut() {
            if task.parent_task_id() == Some(id) {
                task.detach_from_parent();
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read_state().map_err(TaskRepositoryError::persistence)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_subtasks(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state().map_err(TaskRepositoryError::persistence)?;
        Ok(state
            .tasks
            .values()
            .filter(|task| task.parent_task_id() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn find_top_level(
        &self,
        user_id: UserId,
        filter: &TaskFilter,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state().map_err(TaskRepositoryError::persistence)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.parent_task_id().is_none())
            .filter(|task| {
                task.creator_id() == user_id
                    || task.assignee_id() == Some(user_id)
                    || follows(&state, task.id(), user_id)
            })
            .filter(|task| matches_filter(task, filter))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| compare_tasks(a, b, filter.sort_by, filter.sort_order));
        Ok(tasks)
    }
}

#[async_trait]
impl FollowerRepository for InMemoryStore {
    async fn add(&self, follower: &TaskFollower) -> FollowerRepositoryResult<()> {
        let mut state = self
            .write_state()
            .map_err(FollowerRepositoryError::persistence)?;
        state
            .followers
            .entry(follower.task_id())
            .or_default()
            .push(follower.clone());
        Ok(())
    }

    async fn find(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> FollowerRepositoryResult<Option<TaskFollower>> {
        let state = self
            .read_state()
            .map_err(FollowerRepositoryError::persistence)?;
        Ok(state.followers.get(&task_id).and_then(|list| {
            list.iter()
                .find(|follower| follower.user_id() == user_id)
                .cloned()
        }))
    }

    async fn remove(&self, task_id: TaskId, user_id: UserId) -> FollowerRepositoryResult<()> {
        let mut state = self
            .write_state()
            .map_err(FollowerRepositoryError::persistence)?;
        let Some(list) = state.followers.get_mut(&task_id) else {
            return Err(FollowerRepositoryError::NotFound { task_id, user_id });
        };
        let before = list.len();
        list.retain(|follower| follower.user_id() != user_id);
        if list.len() == before {
            return Err(FollowerRepositoryError::NotFound { task_id, user_id });
        }
        if list.is_empty() {
            state.followers.remove(&task_id);
        }
        Ok(())
    }

    async fn list_for_task(&self, task_id: TaskId) -> FollowerRepositoryResult<Vec<TaskFollower>> {
        let state = self
            .read_state()
            .map_err(FollowerRepositoryError::persistence)?;
        Ok(state.followers.get(&task_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryStore {
    async fn append(&self, entry: &TaskHistoryEntry) -> HistoryRepositoryResult<()> {
        let mut state = self
            .write_state()
            .map_err(HistoryRepositoryError::persistence)?;
        state.history.push(entry.clone());
        Ok(())
    }

    async fn list_for_tasks(
        &self,
        task_ids: &[TaskId],
    ) -> HistoryRepositoryResult<Vec<TaskHistoryEntry>> {
        let state = self
            .read_state()
            .map_err(HistoryRepositoryError::persistence)?;
        let mut indexed: Vec<(usize, TaskHistoryEntry)> = state
            .history
            .iter()
            .enumerate()
            .filter(|(_, entry)| task_ids.contains(&entry.task_id()))
            .map(|(index, entry)| (index, entry.clone()))
            .collect();
        // Append order breaks creation-time ties so the newest entry is first.
        indexed.sort_by(|(left_index, left), (right_index, right)| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then(right_index.cmp(left_index))
        });
        Ok(indexed.into_iter().map(|(_, entry)| entry).collect())
    }
}
