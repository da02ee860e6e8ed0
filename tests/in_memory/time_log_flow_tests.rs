//! Time tracking flows that span both services.

use super::helpers::{Board, board};
use rstest::rstest;
use taskboard::error::ErrorKind;
use taskboard::identity::{Actor, UserId};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn members_track_time_independently(board: Board) -> Result<(), eyre::Report> {
    let alice = Actor::member(UserId::new());
    let bob = Actor::member(UserId::new());
    let task = board
        .create_task("Translate docs", &[alice.id(), bob.id()], &["draft"])
        .await?;

    let alice_log = board.tracker.start(task.id(), &alice).await?;
    let bob_log = board.tracker.start(task.id(), &bob).await?;
    let alice_again = board.tracker.start(task.id(), &alice).await;

    eyre::ensure!(
        alice_again.err().map(|err| err.kind()) == Some(ErrorKind::Conflict),
        "second start for alice should conflict"
    );
    let bob_active = board.tracker.get_active(task.id(), &bob).await?;
    eyre::ensure!(bob_active == Some(bob_log), "bob's timer should be active");

    let stopped = board.tracker.stop(task.id(), alice_log.id(), &alice).await?;
    let sheet = board.tracker.list_for_task(task.id(), &bob).await?;

    eyre::ensure!(sheet.time_logs().len() == 2, "expected two sessions");
    eyre::ensure!(
        Some(sheet.total_duration_ms()) == stopped.duration_ms(),
        "only the stopped session counts towards the total"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_assignment_blocks_new_timers(board: Board) -> Result<(), eyre::Report> {
    let member = Actor::member(UserId::new());
    let task = board
        .create_task("Audit access", &[member.id()], &["scan"])
        .await?;
    let running = board.tracker.start(task.id(), &member).await?;

    board
        .tasks
        .update(
            task.id(),
            taskboard::task::services::UpdateTaskRequest::new().with_assignees([]),
            &board.admin,
        )
        .await?;

    let read = board.tracker.get_active(task.id(), &member).await;
    let stop = board.tracker.stop(task.id(), running.id(), &member).await;

    eyre::ensure!(
        read.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden),
        "unassigned member should not read the active timer"
    );
    eyre::ensure!(stop.is_ok(), "owners may still stop their own timer");
    Ok(())
}
