//! Store, update, and delete-cascade tests against embedded `PostgreSQL`.

use super::helpers::{CleanupGuard, build_subtask, build_task, ensure_template, setup_store, test_runtime};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use taskboard::task::{
    domain::{
        HistoryAction, TaskFollower, TaskHistoryEntry, TaskId, TaskPriority, TaskStatus, TeamId,
        UserId,
    },
    ports::{FollowerRepository, HistoryRepository, TaskRepository, TaskRepositoryError},
};

#[rstest]
fn stored_task_round_trips_through_find_by_id(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_store_roundtrip_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let team = TeamId::new();
    let creator = UserId::new();
    let task = build_task("Quarterly report", team, creator);
    let task_id = task.id();

    let rt = test_runtime();
    rt.block_on(store.store(&task)).expect("store should succeed");

    let retrieved = rt
        .block_on(store.find_by_id(task_id))
        .expect("find_by_id should succeed")
        .expect("task should exist");

    assert_eq!(retrieved.id(), task_id);
    assert_eq!(retrieved.title().as_str(), "Quarterly report");
    assert_eq!(retrieved.status(), TaskStatus::Pending);
    assert_eq!(retrieved.priority(), TaskPriority::Medium);
    assert_eq!(retrieved.team_id(), team);
    assert_eq!(retrieved.creator_id(), creator);
    assert!(retrieved.parent_task_id().is_none());
    assert!(retrieved.completed_at().is_none());

    // Timestamptz columns hold microseconds; allow for the truncation.
    let created_drift = (task.created_at() - retrieved.created_at())
        .num_milliseconds()
        .abs();
    assert!(created_drift < 1000, "created_at drifted {created_drift}ms");
}

#[rstest]
fn find_by_id_returns_none_for_missing(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_find_none_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let rt = test_runtime();
    let result = rt
        .block_on(store.find_by_id(TaskId::new()))
        .expect("query should succeed");
    assert!(result.is_none());
}

#[rstest]
fn store_rejects_duplicate_task_id(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_dup_task_id_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let task = build_task("First write", TeamId::new(), UserId::new());
    let task_id = task.id();

    let rt = test_runtime();
    rt.block_on(store.store(&task)).expect("first store");

    // Second insert of the same row trips the primary key.
    let result = rt.block_on(store.store(&task));
    assert!(
        matches!(result, Err(TaskRepositoryError::DuplicateTask(id)) if id == task_id),
        "Expected DuplicateTask error, got: {result:?}"
    );
}

#[rstest]
fn update_rejects_missing_task(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_update_missing_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let task = build_task("Never stored", TeamId::new(), UserId::new());
    let task_id = task.id();

    let rt = test_runtime();
    let result = rt.block_on(store.update(&task));
    assert!(
        matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == task_id),
        "Expected NotFound error, got: {result:?}"
    );
}

#[rstest]
fn delete_rejects_missing_task(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_delete_missing_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let missing = TaskId::new();

    let rt = test_runtime();
    let result = rt.block_on(store.delete(missing));
    assert!(
        matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == missing),
        "Expected NotFound error, got: {result:?}"
    );
}

#[rstest]
fn delete_cascades_followers_and_history_and_detaches_subtasks(
    shared_test_cluster: &'static TestCluster,
) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_delete_cascade_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let team = TeamId::new();
    let creator = UserId::new();
    let watcher = UserId::new();

    let parent = build_task("Release epic", team, creator);
    let parent_id = parent.id();
    let subtask = build_subtask("Cut branch", team, creator, parent_id);
    let subtask_id = subtask.id();

    let rt = test_runtime();
    rt.block_on(store.store(&parent)).expect("store parent");
    rt.block_on(store.store(&subtask)).expect("store subtask");
    rt.block_on(store.add(&TaskFollower::new(parent_id, watcher, &DefaultClock)))
        .expect("add follower");
    rt.block_on(store.append(&TaskHistoryEntry::new(
        parent_id,
        creator,
        HistoryAction::Created,
        &DefaultClock,
    )))
    .expect("append history");

    rt.block_on(store.delete(parent_id)).expect("delete parent");

    // Task row, follower rows, and history rows are all gone.
    let task_row = rt
        .block_on(store.find_by_id(parent_id))
        .expect("find_by_id should succeed");
    assert!(task_row.is_none());

    let follower_row = rt
        .block_on(store.find(parent_id, watcher))
        .expect("follower lookup should succeed");
    assert!(follower_row.is_none());

    let history = rt
        .block_on(store.list_for_tasks(&[parent_id]))
        .expect("history lookup should succeed");
    assert!(history.is_empty());

    // The subtask survives as a top-level task.
    let detached = rt
        .block_on(store.find_by_id(subtask_id))
        .expect("find_by_id should succeed")
        .expect("subtask should survive");
    assert!(detached.parent_task_id().is_none());
}
