//! Port contracts for task persistence.

mod repository;

pub use repository::{
    FollowerRepository, FollowerRepositoryError, FollowerRepositoryResult, HistoryRepository,
    HistoryRepositoryError, HistoryRepositoryResult, TaskRepository, TaskRepositoryError,
    TaskRepositoryResult,
};
