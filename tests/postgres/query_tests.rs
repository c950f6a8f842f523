//! Top-level listing query tests against embedded `PostgreSQL`.

use super::helpers::{CleanupGuard, build_subtask, build_task, ensure_template, setup_store, test_runtime};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use taskboard::task::{
    domain::{
        SortField, SortOrder, Task, TaskFilter, TaskFollower, TaskId, TaskStatus, TeamId, UserId,
    },
    ports::{FollowerRepository, TaskRepository},
};

#[rstest]
fn find_top_level_deduplicates_creator_who_also_follows(
    shared_test_cluster: &'static TestCluster,
) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_follower_dedup_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let team = TeamId::new();
    let user = UserId::new();
    let colleague = UserId::new();
    let stranger = UserId::new();

    // The user creates and follows the same task; the left join must not
    // produce a second row for it.
    let own = build_task("Self-watched", team, user);
    let own_id = own.id();
    let followed = build_task("Colleague's", team, colleague);
    let followed_id = followed.id();
    let unrelated = build_task("Stranger's", team, stranger);

    let rt = test_runtime();
    rt.block_on(store.store(&own)).expect("store own task");
    rt.block_on(store.store(&followed)).expect("store followed task");
    rt.block_on(store.store(&unrelated)).expect("store unrelated task");
    rt.block_on(store.add(&TaskFollower::new(own_id, user, &DefaultClock)))
        .expect("follow own task");
    rt.block_on(store.add(&TaskFollower::new(followed_id, user, &DefaultClock)))
        .expect("follow colleague's task");

    let listing = rt
        .block_on(store.find_top_level(user, &TaskFilter::new()))
        .expect("listing should succeed");

    assert_eq!(listing.len(), 2, "each visible task appears exactly once");
    let ids: Vec<TaskId> = listing.iter().map(Task::id).collect();
    assert!(ids.contains(&own_id));
    assert!(ids.contains(&followed_id));
}

#[rstest]
fn find_top_level_excludes_subtasks(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_top_level_only_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let team = TeamId::new();
    let user = UserId::new();
    let parent = build_task("Parent", team, user);
    let parent_id = parent.id();
    let subtask = build_subtask("Nested", team, user, parent_id);

    let rt = test_runtime();
    rt.block_on(store.store(&parent)).expect("store parent");
    rt.block_on(store.store(&subtask)).expect("store subtask");

    let listing = rt
        .block_on(store.find_top_level(user, &TaskFilter::new()))
        .expect("listing should succeed");

    assert_eq!(listing.len(), 1);
    assert_eq!(listing.first().map(Task::id), Some(parent_id));
}

#[rstest]
fn find_top_level_applies_status_filter(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_status_filter_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let team = TeamId::new();
    let user = UserId::new();
    let pending = build_task("Still open", team, user);
    let pending_id = pending.id();
    let mut finished = build_task("Wrapped up", team, user);
    finished.complete(&DefaultClock);

    let rt = test_runtime();
    rt.block_on(store.store(&pending)).expect("store pending");
    rt.block_on(store.store(&finished)).expect("store finished");

    let filter = TaskFilter::new().with_status(TaskStatus::Pending);
    let listing = rt
        .block_on(store.find_top_level(user, &filter))
        .expect("listing should succeed");

    assert_eq!(listing.len(), 1);
    assert_eq!(listing.first().map(Task::id), Some(pending_id));
}

#[rstest]
fn find_top_level_orders_by_task_id_ascending(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_id_sort_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let store = setup_store(shared_test_cluster, &db_name).expect("store setup");

    let team = TeamId::new();
    let user = UserId::new();

    let rt = test_runtime();
    for title in ["One", "Two", "Three"] {
        rt.block_on(store.store(&build_task(title, team, user)))
            .expect("store task");
    }

    let filter = TaskFilter::new()
        .sort_by(SortField::Id)
        .sort_order(SortOrder::Asc);
    let listing = rt
        .block_on(store.find_top_level(user, &filter))
        .expect("listing should succeed");

    let ids: Vec<uuid::Uuid> = listing
        .iter()
        .map(|task| task.id().into_inner())
        .collect();
    let mut expected = ids.clone();
    expected.sort_unstable();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids, expected);
}
