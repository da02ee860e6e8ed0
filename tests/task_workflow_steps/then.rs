//! Then steps for task workflow scenarios.

use super::world::{TaskWorkflowWorld, run_async};
use rstest_bdd_macros::then;
use taskboard::error::ErrorKind;
use taskboard::task::domain::{ChecklistItem, Task};

fn stored_task(world: &TaskWorkflowWorld) -> Result<Task, eyre::Report> {
    let task_id = world.task()?.id();
    Ok(run_async(world.tasks.get(task_id, &world.admin))?)
}

fn expect_error(world: &TaskWorkflowWorld, expected: ErrorKind) -> Result<(), eyre::Report> {
    match world.last_error {
        Some(kind) if kind == expected => Ok(()),
        other => Err(eyre::eyre!("expected {expected:?} error, got {other:?}")),
    }
}

#[then("the task progress is {progress}")]
fn task_progress_is(world: &TaskWorkflowWorld, progress: u8) -> Result<(), eyre::Report> {
    let actual = stored_task(world)?.progress().value();
    if actual != progress {
        return Err(eyre::eyre!("expected progress {progress}, got {actual}"));
    }
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskWorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let actual = stored_task(world)?.status();
    if actual.as_str() != status {
        return Err(eyre::eyre!("expected status {status}, got {actual}"));
    }
    Ok(())
}

#[then("every checklist item is completed")]
fn every_item_completed(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let task = stored_task(world)?;
    if !task.todo_checklist().iter().all(ChecklistItem::completed) {
        return Err(eyre::eyre!("checklist still has pending items"));
    }
    Ok(())
}

#[then("the request is refused as forbidden")]
fn refused_as_forbidden(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    expect_error(world, ErrorKind::Forbidden)
}

#[then("the request fails with a conflict")]
fn fails_with_conflict(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    expect_error(world, ErrorKind::Conflict)
}

#[then("the request fails validation")]
fn fails_validation(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    expect_error(world, ErrorKind::Validation)
}

#[then("the task has {count} time log")]
fn task_has_time_logs(world: &TaskWorkflowWorld, count: usize) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let sheet = run_async(world.tracker.list_for_task(task_id, &world.admin))?;
    let actual = sheet.time_logs().len();
    if actual != count {
        return Err(eyre::eyre!("expected {count} time logs, got {actual}"));
    }
    Ok(())
}

#[then("the timer is still active")]
fn timer_still_active(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let expected = world.time_log()?;
    let active = run_async(world.tracker.get_active(task_id, &world.member))?;
    if active.as_ref() != Some(expected) || expected.end_time().is_some() {
        return Err(eyre::eyre!("expected the original timer to remain active"));
    }
    Ok(())
}

#[then("the time log duration equals its end minus its start")]
fn duration_matches_bounds(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let time_log = world.time_log()?;
    let end = time_log
        .end_time()
        .ok_or_else(|| eyre::eyre!("time log has no end time"))?;
    let expected = (end - time_log.start_time()).num_milliseconds();
    if time_log.duration_ms() != Some(expected) {
        return Err(eyre::eyre!(
            "expected duration {expected}, got {:?}",
            time_log.duration_ms()
        ));
    }
    Ok(())
}

#[then("the task total duration equals the time log duration")]
fn total_matches_log(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let sheet = run_async(world.tracker.list_for_task(task_id, &world.member))?;
    let expected = world.time_log()?.duration_ms().unwrap_or_default();
    if sheet.total_duration_ms() != expected {
        return Err(eyre::eyre!(
            "expected total {expected}, got {}",
            sheet.total_duration_ms()
        ));
    }
    Ok(())
}
