//! Time-log repository behaviour against `PostgreSQL`, including racing
//! timer starts and stops.

use crate::postgres::helpers::{BoxError, PgContext, pg};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use taskboard::error::ErrorKind;
use taskboard::identity::{Actor, UserId};
use taskboard::task::{domain::TaskId, services::CreateTaskRequest};
use taskboard::time_log::{
    domain::TimeLog,
    ports::{TimeLogRepository, TimeLogRepositoryError},
};
use tokio::task::JoinSet;

const RACERS: usize = 8;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_leave_one_active_timer(
    #[future] pg: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let pg = pg.await?;
    let task_id = TaskId::new();
    let user_id = UserId::new();

    let mut racers = JoinSet::new();
    for _ in 0..RACERS {
        let time_logs = Arc::clone(&pg.time_logs);
        racers.spawn(async move {
            let time_log = TimeLog::start(task_id, user_id, &DefaultClock);
            time_logs.start(&time_log).await
        });
    }
    let results = racers.join_all().await;

    let started = results.iter().filter(|result| result.is_ok()).count();
    let refused = results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(TimeLogRepositoryError::ActiveTimerExists { task_id: t, user_id: u })
                    if *t == task_id && *u == user_id
            )
        })
        .count();
    assert_eq!(started, 1, "exactly one start should win: {results:?}");
    assert_eq!(refused, RACERS - 1, "every other start should be refused");

    let logs = pg.time_logs.list_for_task(task_id).await?;
    assert_eq!(logs.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_stops_record_a_single_end_time(
    #[future] pg: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let pg = pg.await?;
    let running = TimeLog::start(TaskId::new(), UserId::new(), &DefaultClock);
    pg.time_logs.start(&running).await?;

    let mut racers = JoinSet::new();
    for _ in 0..2 {
        let time_logs = Arc::clone(&pg.time_logs);
        let mut stopped = running.clone();
        racers.spawn(async move {
            stopped.stop(&DefaultClock)?;
            time_logs
                .stop(&stopped)
                .await
                .map(|()| stopped)
                .map_err(BoxError::from)
        });
    }
    let results = racers.join_all().await;

    let winners: Vec<&TimeLog> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one stop should win");
    let loser = results
        .iter()
        .find_map(|result| result.as_ref().err())
        .ok_or("one stop should lose")?;
    assert!(
        matches!(
            loser.downcast_ref::<TimeLogRepositoryError>(),
            Some(TimeLogRepositoryError::AlreadyStopped(id)) if *id == running.id()
        ),
        "expected AlreadyStopped, got {loser:?}"
    );

    let stored = pg
        .time_logs
        .find_by_id(running.id())
        .await?
        .ok_or("stopped log should exist")?;
    let winner = winners.first().ok_or("winner")?;
    assert_eq!(stored.end_time(), winner.end_time());
    assert_eq!(stored.duration_ms(), winner.duration_ms());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_duration_matches_stored_bounds(
    #[future] pg: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let pg = pg.await?;
    let mut time_log = TimeLog::start(TaskId::new(), UserId::new(), &DefaultClock);
    pg.time_logs.start(&time_log).await?;
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    time_log.stop(&DefaultClock)?;
    pg.time_logs.stop(&time_log).await?;

    let stored = pg
        .time_logs
        .find_by_id(time_log.id())
        .await?
        .ok_or("stopped log should exist")?;
    let end = stored.end_time().ok_or("stored log should be stopped")?;

    assert_eq!(stored, time_log);
    assert_eq!(
        stored.duration_ms(),
        Some((end - stored.start_time()).num_milliseconds())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopping_unknown_log_reports_not_found(
    #[future] pg: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let pg = pg.await?;
    let mut time_log = TimeLog::start(TaskId::new(), UserId::new(), &DefaultClock);
    time_log.stop(&DefaultClock)?;

    let result = pg.time_logs.stop(&time_log).await;

    assert!(
        matches!(result, Err(TimeLogRepositoryError::NotFound(id)) if id == time_log.id()),
        "expected NotFound, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tracker_answers_conflict_to_concurrent_starts(
    #[future] pg: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let pg = pg.await?;
    let admin = Actor::admin(UserId::new());
    let member = Actor::member(UserId::new());
    let task = pg
        .task_service
        .create(
            CreateTaskRequest::new("Pair on review").with_assignees([member.id()]),
            &admin,
        )
        .await?;

    let (first, second) = tokio::join!(
        pg.tracker.start(task.id(), &member),
        pg.tracker.start(task.id(), &member),
    );
    let kinds = [
        first.as_ref().err().map(|err| err.kind()),
        second.as_ref().err().map(|err| err.kind()),
    ];

    assert!(
        kinds.contains(&None) && kinds.contains(&Some(ErrorKind::Conflict)),
        "one start should succeed and one conflict: {kinds:?}"
    );
    let active = pg.tracker.get_active(task.id(), &member).await?;
    let winner = first.or(second)?;
    assert_eq!(active, Some(winner));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_for_task_is_newest_first(
    #[future] pg: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let pg = pg.await?;
    let task_id = TaskId::new();
    let mut earlier = TimeLog::start(task_id, UserId::new(), &DefaultClock);
    pg.time_logs.start(&earlier).await?;
    earlier.stop(&DefaultClock)?;
    pg.time_logs.stop(&earlier).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let later = TimeLog::start(task_id, UserId::new(), &DefaultClock);
    pg.time_logs.start(&later).await?;
    pg.time_logs
        .start(&TimeLog::start(TaskId::new(), UserId::new(), &DefaultClock))
        .await?;

    let listed = pg.time_logs.list_for_task(task_id).await?;
    let ids: Vec<_> = listed.iter().map(TimeLog::id).collect();

    assert_eq!(ids, [later.id(), earlier.id()]);
    Ok(())
}
