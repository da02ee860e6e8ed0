//! Task lifecycle flows across members and administrators.

use super::helpers::{Board, board, checklist};
use rstest::rstest;
use taskboard::error::ErrorKind;
use taskboard::identity::{Actor, UserId};
use taskboard::task::{
    domain::TaskStatus,
    services::{DashboardScope, UpdateTaskRequest},
};

const STEPS: [&str; 3] = ["collect receipts", "reconcile", "file report"];

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn member_drives_task_to_completion(board: Board) -> Result<(), eyre::Report> {
    let member = Actor::member(UserId::new());
    let task = board
        .create_task("Expense report", &[member.id()], &STEPS)
        .await?;

    for (done, expected_progress, expected_status) in [
        (1, 33, TaskStatus::InProgress),
        (2, 67, TaskStatus::InProgress),
        (3, 100, TaskStatus::Completed),
    ] {
        let updated = board
            .tasks
            .update_checklist(task.id(), checklist(&STEPS, done), &member)
            .await?;
        eyre::ensure!(
            updated.progress().value() == expected_progress,
            "expected progress {expected_progress}, got {}",
            updated.progress()
        );
        eyre::ensure!(updated.status() == expected_status, "unexpected status");
    }

    let dashboard = board
        .tasks
        .dashboard(DashboardScope::User(member.id()), &member)
        .await?;
    eyre::ensure!(dashboard.statistics.completed_tasks == 1, "task not counted as completed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassignment_moves_visibility(board: Board) -> Result<(), eyre::Report> {
    let first = Actor::member(UserId::new());
    let second = Actor::member(UserId::new());
    let task = board.create_task("Rotate keys", &[first.id()], &STEPS).await?;

    board
        .tasks
        .update(
            task.id(),
            UpdateTaskRequest::new().with_assignees([second.id()]),
            &board.admin,
        )
        .await?;

    let first_listing = board.tasks.list(None, &first).await?;
    let second_listing = board.tasks.list(None, &second).await?;
    let refused = board
        .tasks
        .update_checklist(task.id(), checklist(&STEPS, 1), &first)
        .await;

    eyre::ensure!(first_listing.tasks.is_empty(), "previous assignee still sees task");
    eyre::ensure!(second_listing.tasks.len() == 1, "new assignee cannot see task");
    eyre::ensure!(
        refused.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden),
        "previous assignee should be refused"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shared_task_is_visible_to_every_assignee(board: Board) -> Result<(), eyre::Report> {
    let alice = Actor::member(UserId::new());
    let bob = Actor::member(UserId::new());
    board
        .create_task("Pair review", &[alice.id(), bob.id()], &STEPS)
        .await?;
    board.create_task("Solo task", &[alice.id()], &STEPS).await?;

    let alice_listing = board.tasks.list(None, &alice).await?;
    let bob_listing = board.tasks.list(None, &bob).await?;
    let admin_listing = board.tasks.list(None, &board.admin).await?;

    eyre::ensure!(alice_listing.status_summary.all == 2, "alice should see two tasks");
    eyre::ensure!(bob_listing.status_summary.all == 1, "bob should see one task");
    eyre::ensure!(admin_listing.status_summary.all == 2, "admin sees every task");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_filter_narrows_listing(board: Board) -> Result<(), eyre::Report> {
    let member = Actor::member(UserId::new());
    let started = board.create_task("Started", &[member.id()], &STEPS).await?;
    board.create_task("Untouched", &[member.id()], &STEPS).await?;
    board
        .tasks
        .update_checklist(started.id(), checklist(&STEPS, 1), &member)
        .await?;

    let in_progress = board
        .tasks
        .list(Some(TaskStatus::InProgress), &member)
        .await?;

    eyre::ensure!(in_progress.tasks.len() == 1, "expected one in-progress task");
    eyre::ensure!(
        in_progress.tasks.first().map(|entry| entry.completed_todo_count) == Some(1),
        "completed todo count missing"
    );
    eyre::ensure!(
        in_progress.status_summary.pending_tasks == 1,
        "summary should ignore the status filter"
    );
    Ok(())
}
