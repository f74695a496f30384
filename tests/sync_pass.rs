use std::time::Duration;

use anyhow::Result;
use surveysync::{live, run_pass, PassSummary, SurveyTable, SyncOptions, SyncStatus};

#[path = "util.rs"]
mod util;

fn instant() -> SyncOptions {
    SyncOptions {
        latency: Duration::ZERO,
    }
}

#[tokio::test]
async fn offline_pass_is_a_noop() -> Result<()> {
    let store = util::memory_store().await?;
    util::seed_surveyor_at(&store, 1_000, "pending").await?;

    let summary = run_pass(&store, false, instant()).await?;
    assert_eq!(summary, PassSummary::default());
    assert_eq!(store.pending_ids(SurveyTable::Surveyors).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn pass_with_nothing_pending_issues_no_updates() -> Result<()> {
    let store = util::memory_store().await?;
    util::seed_event_at(&store, 1_000, "synced").await?;

    let summary = run_pass(&store, true, instant()).await?;
    assert_eq!(summary.total(), 0);
    assert_eq!(summary.tables_updated(), 0);
    Ok(())
}

#[tokio::test]
async fn pass_updates_only_tables_with_pending_records() -> Result<()> {
    let store = util::memory_store().await?;
    util::seed_surveyor_at(&store, 1_000, "pending").await?;
    util::seed_regular_at(&store, 1_000, "pending").await?;
    util::seed_regular_at(&store, 2_000, "pending").await?;
    util::seed_event_at(&store, 1_000, "synced").await?;

    let summary = run_pass(&store, true, instant()).await?;
    assert_eq!(summary.surveyors, 1);
    assert_eq!(summary.regular, 2);
    assert_eq!(summary.events, 0);
    assert_eq!(summary.tables_updated(), 2);

    assert_eq!(live::pending_count(&store).await?, 0);
    assert_eq!(
        store
            .count_by_status(SurveyTable::EventResponses, SyncStatus::Synced)
            .await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn offline_record_becomes_synced_after_going_online() -> Result<()> {
    let store = util::memory_store().await?;
    let id = util::seed_surveyor_at(&store, 1_000, "pending").await?;
    assert_eq!(live::pending_count(&store).await?, 1);

    let summary = run_pass(&store, true, instant()).await?;
    assert_eq!(summary.surveyors, 1);
    assert_eq!(live::pending_count(&store).await?, 0);

    let records = store.surveyors_in_range(0, 2_000).await?;
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].status, SyncStatus::Synced);
    Ok(())
}

#[tokio::test]
async fn synced_records_never_revert() -> Result<()> {
    let store = util::memory_store().await?;
    util::seed_regular_at(&store, 1_000, "pending").await?;

    run_pass(&store, true, instant()).await?;
    let second = run_pass(&store, true, instant()).await?;
    assert_eq!(second, PassSummary::default());
    assert_eq!(
        store
            .count_by_status(SurveyTable::RegularResponses, SyncStatus::Synced)
            .await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn failed_pass_keeps_earlier_table_updates() -> Result<()> {
    let store = util::memory_store().await?;
    util::seed_surveyor_at(&store, 1_000, "pending").await?;
    util::seed_event_at(&store, 1_000, "pending").await?;

    // Reads still work, but the bulk update on the last table fails
    // mid-pass.
    sqlx::query(
        "CREATE TRIGGER block_event_sync BEFORE UPDATE ON survey_event_responses \
         BEGIN SELECT RAISE(ABORT, 'simulated update failure'); END",
    )
    .execute(store.pool())
    .await?;

    let err = run_pass(&store, true, instant()).await;
    assert!(err.is_err());

    // The surveyors update committed before the failure and stays.
    assert_eq!(
        store
            .count_by_status(SurveyTable::Surveyors, SyncStatus::Synced)
            .await?,
        1
    );
    Ok(())
}
