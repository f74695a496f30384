use std::time::Duration;

use anyhow::Result;
use surveysync::state::{DEMO_EMAIL, DEMO_PASSWORD};
use surveysync::{
    live, spawn_sync_worker, AppState, SessionFlags, SurveyTable, SyncOptions, SyncStatus,
};
use tokio::time::timeout;

#[path = "util.rs"]
mod util;

fn instant() -> SyncOptions {
    SyncOptions {
        latency: Duration::ZERO,
    }
}

#[tokio::test]
async fn worker_runs_a_pass_once_all_flags_hold() -> Result<()> {
    let store = util::memory_store().await?;
    util::seed_surveyor_at(&store, 1_000, "pending").await?;

    let state = AppState::new(store.clone(), SessionFlags::default());
    let worker = spawn_sync_worker(state.clone(), instant());

    let mut feed = store.changes().subscribe(SurveyTable::Surveyors);

    // Each flag alone is not enough.
    state.set_online(true);
    state.login(DEMO_EMAIL, DEMO_PASSWORD);
    assert_eq!(live::pending_count(&store).await?, 1);

    state.mark_store_ready();
    timeout(Duration::from_secs(5), feed.changed())
        .await
        .expect("reconciliation did not run")?;

    assert_eq!(live::pending_count(&store).await?, 0);
    assert_eq!(
        store
            .count_by_status(SurveyTable::Surveyors, SyncStatus::Synced)
            .await?,
        1
    );
    worker.abort();
    Ok(())
}

#[tokio::test]
async fn worker_does_nothing_while_offline() -> Result<()> {
    let store = util::memory_store().await?;
    util::seed_regular_at(&store, 1_000, "pending").await?;

    let state = AppState::new(
        store.clone(),
        SessionFlags {
            online: false,
            authenticated: true,
            store_ready: true,
        },
    );
    let worker = spawn_sync_worker(state.clone(), instant());

    let mut feed = store.changes().subscribe(SurveyTable::RegularResponses);
    let waited = timeout(Duration::from_millis(200), feed.changed()).await;
    assert!(waited.is_err(), "no table update should happen offline");
    assert_eq!(live::pending_count(&store).await?, 1);

    // Connectivity is the last flag to flip; the worker reacts to it.
    state.set_online(true);
    timeout(Duration::from_secs(5), feed.changed())
        .await
        .expect("reconciliation did not run")?;
    assert_eq!(live::pending_count(&store).await?, 0);

    worker.abort();
    Ok(())
}

#[tokio::test]
async fn worker_handles_repeated_offline_online_cycles() -> Result<()> {
    let store = util::memory_store().await?;
    let state = AppState::new(
        store.clone(),
        SessionFlags {
            online: false,
            authenticated: true,
            store_ready: true,
        },
    );
    let worker = spawn_sync_worker(state.clone(), instant());
    let mut feed = store.changes().subscribe(SurveyTable::EventResponses);

    util::seed_event_at(&store, 1_000, "pending").await?;
    state.set_online(true);
    timeout(Duration::from_secs(5), feed.changed())
        .await
        .expect("first reconciliation did not run")?;
    assert_eq!(live::pending_count(&store).await?, 0);

    // A second offline capture is picked up by the next toggle.
    state.set_online(false);
    util::seed_event_at(&store, 2_000, "pending").await?;
    state.set_online(true);
    timeout(Duration::from_secs(5), feed.changed())
        .await
        .expect("second reconciliation did not run")?;
    assert_eq!(live::pending_count(&store).await?, 0);

    worker.abort();
    Ok(())
}
