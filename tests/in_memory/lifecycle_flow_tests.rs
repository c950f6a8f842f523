//! End-to-end lifecycle flows over the in-memory store.

use super::helpers::{create_task, service, Service};
use rstest::{fixture, rstest};
use taskboard::task::{
    domain::{HistoryAction, TaskPatch, TaskPriority, TaskStatus, TeamId, UserId},
    services::{CreateTaskRequest, TaskLifecycleError},
};

#[fixture]
#[once]
fn team() -> TeamId {
    TeamId::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn epic_with_subtasks_completes_through_cascade(team: &TeamId) {
    let service = service();
    let lead = UserId::new();
    let engineer = UserId::new();

    let epic = service
        .create(
            CreateTaskRequest::new("Migrate billing service", *team)
                .with_priority(TaskPriority::High)
                .with_followers(vec![engineer]),
            lead,
        )
        .await
        .expect("epic creation should succeed");
    let epic_id = epic.task().id();

    let mut subtask_ids = Vec::new();
    for title in ["Write migration plan", "Dual-write phase", "Cutover"] {
        let subtask = service
            .create(
                CreateTaskRequest::new(title, *team)
                    .with_parent(epic_id)
                    .with_assignee(engineer),
                lead,
            )
            .await
            .expect("subtask creation should succeed");
        subtask_ids.push(subtask.task().id());
    }

    // The engineer works each subtask to completion.
    for &subtask_id in &subtask_ids {
        service
            .update(
                subtask_id,
                &TaskPatch::new().with_status(TaskStatus::InProgress),
                engineer,
            )
            .await
            .expect("start update should succeed");
        service
            .update(
                subtask_id,
                &TaskPatch::new().with_status(TaskStatus::Completed),
                engineer,
            )
            .await
            .expect("completion update should succeed");
    }

    let epic_after = service
        .find_one(epic_id, engineer)
        .await
        .expect("follower should read the epic");
    assert_eq!(epic_after.task().status(), TaskStatus::Completed);
    assert!(epic_after.task().completed_at().is_some());
    assert_eq!(epic_after.subtasks().len(), 3);

    let history = service
        .get_history(epic_id, lead)
        .await
        .expect("history should load");
    let auto_completed = history
        .iter()
        .filter(|entry| entry.action() == HistoryAction::Completed)
        .count();
    assert_eq!(auto_completed, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn comment_flow_returns_full_history(team: &TeamId) {
    let service = service();
    let creator = UserId::new();
    let task_id = create_task(&service, "Standup notes", *team, creator).await;

    let history = service
        .add_comment(task_id, "kickoff done", creator)
        .await
        .expect("comment should succeed");

    // Comment plus the created entry, newest first.
    assert_eq!(history.len(), 2);
    assert_eq!(
        history.first().map(|entry| entry.action()),
        Some(HistoryAction::Comment)
    );
    assert_eq!(
        history.last().map(|entry| entry.action()),
        Some(HistoryAction::Created)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_cascades_history_and_followers(team: &TeamId) {
    let service = service();
    let creator = UserId::new();
    let follower = UserId::new();

    let task = service
        .create(
            CreateTaskRequest::new("Ephemeral task", *team).with_followers(vec![follower]),
            creator,
        )
        .await
        .expect("task creation should succeed");
    let task_id = task.task().id();

    service
        .remove(task_id, creator)
        .await
        .expect("removal should succeed");

    let lookup = service.find_one(task_id, creator).await;
    assert!(matches!(lookup, Err(TaskLifecycleError::NotFound(_))));

    // A recreated task under the same user starts with a clean slate.
    let listing = service
        .find_all(follower, &taskboard::task::domain::TaskFilter::new())
        .await
        .expect("listing should succeed");
    assert!(listing.is_empty());
}

async fn run_lifecycle(service: &Service, team: TeamId) {
    let creator = UserId::new();
    let task_id = create_task(service, "Loop task", team, creator).await;
    service
        .update(
            task_id,
            &TaskPatch::new().with_status(TaskStatus::Completed),
            creator,
        )
        .await
        .expect("completion should succeed");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_lifecycles_do_not_interfere(team: &TeamId) {
    let service = service();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let worker = service.clone();
        let team_id = *team;
        handles.push(tokio::spawn(async move {
            run_lifecycle(&worker, team_id).await;
        }));
    }
    for handle in handles {
        handle.await.expect("lifecycle task should not panic");
    }
}
