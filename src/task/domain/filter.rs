//! Filtering and ordering criteria for task listings.

use super::{TaskStatus, TeamId, UserId};
use chrono::{DateTime, Utc};

/// Field used to order task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    /// Order by creation time (default).
    #[default]
    CreatedAt,
    /// Order by due date.
    DueTime,
    /// Order by creator identifier.
    CreatorId,
    /// Order by task identifier.
    Id,
}

/// Direction used to order task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order (default).
    #[default]
    Desc,
}

/// Inclusive creation-time window; both bounds are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl CreatedRange {
    /// Creates a window over `[start, end]`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Returns the window start.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the window end.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns whether the timestamp falls inside the window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Optional criteria combined with AND over a task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to one team.
    pub team_id: Option<TeamId>,
    /// Restrict to one status.
    pub status: Option<TaskStatus>,
    /// Restrict to one creator.
    pub creator_id: Option<UserId>,
    /// Restrict to one assignee.
    pub assignee_id: Option<UserId>,
    /// Restrict to a creation-time window.
    pub created: Option<CreatedRange>,
    /// Ordering field.
    pub sort_by: SortField,
    /// Ordering direction.
    pub sort_order: SortOrder,
}

impl TaskFilter {
    /// Creates an unconstrained filter with default ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to one team.
    #[must_use]
    pub const fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Restricts results to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts results to one creator.
    #[must_use]
    pub const fn with_creator(mut self, creator_id: UserId) -> Self {
        self.creator_id = Some(creator_id);
        self
    }

    /// Restricts results to one assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Restricts results to tasks created inside `[start, end]`.
    #[must_use]
    pub const fn with_created_between(
        mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        self.created = Some(CreatedRange::new(start, end));
        self
    }

    /// Sets the ordering field.
    #[must_use]
    pub const fn sort_by(mut self, field: SortField) -> Self {
        self.sort_by = field;
        self
    }

    /// Sets the ordering direction.
    #[must_use]
    pub const fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }
}
