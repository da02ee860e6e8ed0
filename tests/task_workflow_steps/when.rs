//! When steps for task workflow scenarios.

use super::world::{TaskWorkflowWorld, run_async};
use rstest_bdd_macros::when;
use taskboard::identity::{Actor, UserId};
use taskboard::task::domain::{ChecklistItem, Task, TaskStatus};

fn checklist_with_completed(task: &Task, completed: usize) -> Vec<ChecklistItem> {
    task.todo_checklist()
        .iter()
        .enumerate()
        .map(|(index, item)| ChecklistItem::new(item.text(), index < completed))
        .collect()
}

#[when("the member completes {completed} checklist items")]
fn member_completes_items(
    world: &mut TaskWorkflowWorld,
    completed: usize,
) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let checklist = checklist_with_completed(task, completed);
    let updated = run_async(
        world
            .tasks
            .update_checklist(task.id(), checklist, &world.member),
    )?;
    world.task = Some(updated);
    Ok(())
}

#[when("an unassigned member completes {completed} checklist items")]
fn outsider_completes_items(
    world: &mut TaskWorkflowWorld,
    completed: usize,
) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let checklist = checklist_with_completed(task, completed);
    let outsider = Actor::member(UserId::new());
    let result = run_async(world.tasks.update_checklist(task.id(), checklist, &outsider));
    world.last_error = result.err().map(|err| err.kind());
    Ok(())
}

#[when(r#"the member sets the task status to "{status}""#)]
fn member_sets_status(world: &mut TaskWorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let parsed = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("unknown status {status}: {err}"))?;
    let task_id = world.task()?.id();
    let updated = run_async(world.tasks.update_status(task_id, parsed, &world.member))?;
    world.task = Some(updated);
    Ok(())
}

#[when("the member starts another timer")]
fn member_starts_another_timer(world: &mut TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let result = run_async(world.tracker.start(task_id, &world.member));
    world.last_error = result.err().map(|err| err.kind());
    Ok(())
}

#[when("the member stops the timer")]
fn member_stops_timer(world: &mut TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let time_log_id = world.time_log()?.id();
    let stopped = run_async(world.tracker.stop(task_id, time_log_id, &world.member))?;
    world.time_log = Some(stopped);
    Ok(())
}

#[when("the member stops the timer against the second task")]
fn member_stops_timer_on_second_task(world: &mut TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let other_task_id = world
        .second_task
        .as_ref()
        .map(Task::id)
        .ok_or_else(|| eyre::eyre!("missing second task in scenario world"))?;
    let time_log_id = world.time_log()?.id();
    let result = run_async(world.tracker.stop(other_task_id, time_log_id, &world.member));
    world.last_error = result.err().map(|err| err.kind());
    Ok(())
}
