//! Unit tests for the task module.
//!
//! Tests are organised by concern: pure domain behaviour, access checks,
//! service orchestration, the parent-completion cascade, and the history
//! log.


use crate::task::{adapters::memory::InMemoryStore, services::TaskLifecycleService};
use mockable::DefaultClock;
use std::sync::Arc;

pub(crate) type TestService =
    TaskLifecycleService<InMemoryStore, InMemoryStore, InMemoryStore, DefaultClock>;

pub(crate) fn test_service() -> TestService {
    TaskLifecycleService::with_store(Arc::new(InMemoryStore::new()), Arc::new(DefaultClock))
}
