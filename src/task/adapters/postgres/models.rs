//! Diesel row models for task persistence.

use super::schema::{task_followers, task_history, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Priority band.
    pub priority: String,
    /// Owning team identifier.
    pub team_id: uuid::Uuid,
    /// Optional parent task reference.
    pub parent_task_id: Option<uuid::Uuid>,
    /// Creating user identifier.
    pub creator_id: uuid::Uuid,
    /// Optional assignee identifier.
    pub assignee_id: Option<uuid::Uuid>,
    /// Optional scheduled start.
    pub start_time: Option<DateTime<Utc>>,
    /// Optional due date.
    pub due_time: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for task records.
///
/// `treat_none_as_null` keeps updates faithful to the aggregate: a cleared
/// optional column is written as NULL rather than skipped.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Priority band.
    pub priority: String,
    /// Owning team identifier.
    pub team_id: uuid::Uuid,
    /// Optional parent task reference.
    pub parent_task_id: Option<uuid::Uuid>,
    /// Creating user identifier.
    pub creator_id: uuid::Uuid,
    /// Optional assignee identifier.
    pub assignee_id: Option<uuid::Uuid>,
    /// Optional scheduled start.
    pub start_time: Option<DateTime<Utc>>,
    /// Optional due date.
    pub due_time: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result and insert model for follower records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_followers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FollowerRow {
    /// Followed task identifier.
    pub task_id: uuid::Uuid,
    /// Following user identifier.
    pub user_id: uuid::Uuid,
    /// When the user started following.
    pub followed_at: DateTime<Utc>,
}

/// Query result and insert model for history entries.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning task identifier.
    pub task_id: uuid::Uuid,
    /// Acting user identifier.
    pub user_id: uuid::Uuid,
    /// Action kind.
    pub action: String,
    /// Optional structured diff payload.
    pub changes: Option<Value>,
    /// Optional comment text.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
