//! Shared fixtures for in-memory integration tests.

use mockable::DefaultClock;
use std::sync::Arc;
use taskboard::task::{
    adapters::memory::InMemoryStore,
    domain::{TaskId, TeamId, UserId},
    services::{CreateTaskRequest, TaskLifecycleService},
};

/// Service wired against one shared in-memory store.
pub type Service = TaskLifecycleService<InMemoryStore, InMemoryStore, InMemoryStore, DefaultClock>;

/// Creates a service over a fresh store.
#[must_use]
pub fn service() -> Service {
    TaskLifecycleService::with_store(Arc::new(InMemoryStore::new()), Arc::new(DefaultClock))
}

/// Creates a plain top-level task and returns its id.
pub async fn create_task(service: &Service, title: &str, team: TeamId, creator: UserId) -> TaskId {
    service
        .create(CreateTaskRequest::new(title, team), creator)
        .await
        .expect("task creation should succeed")
        .task()
        .id()
}
