//! `PostgreSQL` repository implementation for task lifecycle storage.

use super::{
    models::{FollowerRow, HistoryRow, NewTaskRow, TaskRow},
    schema::{task_followers, task_history, tasks},
};
use crate::task::{
    domain::{
        HistoryAction, HistoryEntryId, PersistedHistoryData, PersistedTaskData, SortField,
        SortOrder, Task, TaskFilter, TaskFollower, TaskHistoryEntry, TaskId, TaskPriority,
        TaskStatus, TaskTitle, TeamId, UserId,
    },
    ports::{
        FollowerRepository, FollowerRepositoryError, FollowerRepositoryResult, HistoryRepository,
        HistoryRepositoryError, HistoryRepositoryResult, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed store implementing all three repository ports.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: TaskPgPool,
}

/// Maps pool and join failures into a port error type.
trait PersistenceError: Sized {
    /// Wraps an infrastructure error.
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self;
}

impl PersistenceError for TaskRepositoryError {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceError for FollowerRepositoryError {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceError for HistoryRepositoryError {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PostgresStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: PersistenceError + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(E::wrap)?;
            f(&mut connection)
        })
        .await
        .map_err(E::wrap)?
    }
}

fn to_task_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(ToOwned::to_owned),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        team_id: task.team_id().into_inner(),
        parent_task_id: task.parent_task_id().map(TaskId::into_inner),
        creator_id: task.creator_id().into_inner(),
        assignee_id: task.assignee_id().map(UserId::into_inner),
        start_time: task.start_time(),
        due_time: task.due_time(),
        completed_at: task.completed_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let title = TaskTitle::new(row.title).map_err(TaskRepositoryError::persistence)?;
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let priority =
        TaskPriority::try_from(row.priority.as_str()).map_err(TaskRepositoryError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        title,
        description: row.description,
        status,
        priority,
        team_id: TeamId::from_uuid(row.team_id),
        parent_task_id: row.parent_task_id.map(TaskId::from_uuid),
        creator_id: UserId::from_uuid(row.creator_id),
        assignee_id: row.assignee_id.map(UserId::from_uuid),
        start_time: row.start_time,
        due_time: row.due_time,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_history(row: HistoryRow) -> HistoryRepositoryResult<TaskHistoryEntry> {
    let action =
        HistoryAction::try_from(row.action.as_str()).map_err(HistoryRepositoryError::persistence)?;
    Ok(TaskHistoryEntry::from_persisted(PersistedHistoryData {
        id: HistoryEntryId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        user_id: UserId::from_uuid(row.user_id),
        action,
        changes: row.changes,
        comment: row.comment,
        created_at: row.created_at,
    }))
}

#[async_trait]
impl TaskRepository for PostgresStore {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_task_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task);

        self.run_blocking(move |connection| {
            let affected = diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if affected == 0 {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            // One transaction so followers, history, and subtask links never
            // outlive the task row.
            let affected = connection
                .transaction::<usize, DieselError, _>(|conn| {
                    diesel::update(
                        tasks::table.filter(tasks::parent_task_id.eq(id.into_inner())),
                    )
                    .set(tasks::parent_task_id.eq(None::<uuid::Uuid>))
                    .execute(conn)?;
                    diesel::delete(
                        task_followers::table
                            .filter(task_followers::task_id.eq(id.into_inner())),
                    )
                    .execute(conn)?;
                    diesel::delete(
                        task_history::table.filter(task_history::task_id.eq(id.into_inner())),
                    )
                    .execute(conn)?;
                    diesel::delete(tasks::table.find(id.into_inner())).execute(conn)
                })
                .map_err(TaskRepositoryError::persistence)?;
            if affected == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_subtasks(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::parent_task_id.eq(parent_id.into_inner()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn find_top_level(
        &self,
        user_id: UserId,
        filter: &TaskFilter,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let user = user_id.into_inner();
        let filter = filter.clone();

        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .left_join(task_followers::table)
                .filter(tasks::parent_task_id.is_null())
                .filter(
                    tasks::creator_id
                        .eq(user)
                        .or(tasks::assignee_id.eq(user))
                        .or(task_followers::user_id.eq(user)),
                )
                .select(TaskRow::as_select())
                .distinct()
                .into_boxed();

            if let Some(team_id) = filter.team_id {
                query = query.filter(tasks::team_id.eq(team_id.into_inner()));
            }
            if let Some(status) = filter.status {
                query = query.filter(tasks::status.eq(status.as_str()));
            }
            if let Some(creator_id) = filter.creator_id {
                query = query.filter(tasks::creator_id.eq(creator_id.into_inner()));
            }
            if let Some(assignee_id) = filter.assignee_id {
                query = query.filter(tasks::assignee_id.eq(assignee_id.into_inner()));
            }
            if let Some(range) = filter.created {
                query = query.filter(tasks::created_at.between(range.start(), range.end()));
            }

            query = match (filter.sort_by, filter.sort_order) {
                (SortField::CreatedAt, SortOrder::Asc) => query.order(tasks::created_at.asc()),
                (SortField::CreatedAt, SortOrder::Desc) => query.order(tasks::created_at.desc()),
                (SortField::DueTime, SortOrder::Asc) => query.order(tasks::due_time.asc()),
                (SortField::DueTime, SortOrder::Desc) => query.order(tasks::due_time.desc()),
                (SortField::CreatorId, SortOrder::Asc) => query.order(tasks::creator_id.asc()),
                (SortField::CreatorId, SortOrder::Desc) => query.order(tasks::creator_id.desc()),
                (SortField::Id, SortOrder::Asc) => query.order(tasks::id.asc()),
                (SortField::Id, SortOrder::Desc) => query.order(tasks::id.desc()),
            };

            let rows = query
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

#[async_trait]
impl FollowerRepository for PostgresStore {
    async fn add(&self, follower: &TaskFollower) -> FollowerRepositoryResult<()> {
        let row = FollowerRow {
            task_id: follower.task_id().into_inner(),
            user_id: follower.user_id().into_inner(),
            followed_at: follower.followed_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(task_followers::table)
                .values(&row)
                .execute(connection)
                .map_err(FollowerRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> FollowerRepositoryResult<Option<TaskFollower>> {
        self.run_blocking(move |connection| {
            let row = task_followers::table
                .find((task_id.into_inner(), user_id.into_inner()))
                .select(FollowerRow::as_select())
                .first::<FollowerRow>(connection)
                .optional()
                .map_err(FollowerRepositoryError::persistence)?;
            Ok(row.map(|row| {
                TaskFollower::from_persisted(
                    TaskId::from_uuid(row.task_id),
                    UserId::from_uuid(row.user_id),
                    row.followed_at,
                )
            }))
        })
        .await
    }

    async fn remove(&self, task_id: TaskId, user_id: UserId) -> FollowerRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let affected = diesel::delete(
                task_followers::table.find((task_id.into_inner(), user_id.into_inner())),
            )
            .execute(connection)
            .map_err(FollowerRepositoryError::persistence)?;
            if affected == 0 {
                return Err(FollowerRepositoryError::NotFound { task_id, user_id });
            }
            Ok(())
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> FollowerRepositoryResult<Vec<TaskFollower>> {
        self.run_blocking(move |connection| {
            let rows = task_followers::table
                .filter(task_followers::task_id.eq(task_id.into_inner()))
                .select(FollowerRow::as_select())
                .load::<FollowerRow>(connection)
                .map_err(FollowerRepositoryError::persistence)?;
            Ok(rows
                .into_iter()
                .map(|row| {
                    TaskFollower::from_persisted(
                        TaskId::from_uuid(row.task_id),
                        UserId::from_uuid(row.user_id),
                        row.followed_at,
                    )
                })
                .collect())
        })
        .await
    }
}

#[async_trait]
impl HistoryRepository for PostgresStore {
    async fn append(&self, entry: &TaskHistoryEntry) -> HistoryRepositoryResult<()> {
        let row = HistoryRow {
            id: entry.id().into_inner(),
            task_id: entry.task_id().into_inner(),
            user_id: entry.user_id().into_inner(),
            action: entry.action().as_str().to_owned(),
            changes: entry.changes().cloned(),
            comment: entry.comment().map(ToOwned::to_owned),
            created_at: entry.created_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(task_history::table)
                .values(&row)
                .execute(connection)
                .map_err(HistoryRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_for_tasks(
        &self,
        task_ids: &[TaskId],
    ) -> HistoryRepositoryResult<Vec<TaskHistoryEntry>> {
        let ids: Vec<uuid::Uuid> = task_ids.iter().copied().map(TaskId::into_inner).collect();

        self.run_blocking(move |connection| {
            let rows = task_history::table
                .filter(task_history::task_id.eq_any(ids))
                .order(task_history::created_at.desc())
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)
                .map_err(HistoryRepositoryError::persistence)?;
            rows.into_iter().map(row_to_history).collect()
        })
        .await
    }
}
