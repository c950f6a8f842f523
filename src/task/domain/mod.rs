//! Domain model for team task tracking.
//!
//! The task domain models task creation, partial updates, follower
//! registration, and the append-only audit history while keeping all
//! infrastructure concerns outside of the domain boundary.

mod detail;
mod error;
mod filter;
mod follower;
mod history;
mod ids;
mod task;

pub use detail::TaskDetail;
pub use error::{
    ParseHistoryActionError, ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError,
};
pub use filter::{CreatedRange, SortField, SortOrder, TaskFilter};
pub use follower::TaskFollower;
pub use history::{HistoryAction, PersistedHistoryData, TaskHistoryEntry};
pub use ids::{HistoryEntryId, TaskId, TaskTitle, TeamId, UserId};
pub use task::{NewTaskData, PersistedTaskData, Task, TaskPatch, TaskPriority, TaskStatus};
