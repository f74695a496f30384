use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::AppResult;
use crate::state::AppState;
use crate::store::{Store, SurveyTable};

/// Simulated upstream acknowledgment latency, paid once per pass and
/// shared across all three tables.
pub const SYNC_LATENCY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub latency: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            latency: SYNC_LATENCY,
        }
    }
}

/// Outcome of one reconciliation pass: how many records each table
/// promoted to synced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub surveyors: usize,
    pub regular: usize,
    pub events: usize,
}

impl PassSummary {
    pub fn total(&self) -> usize {
        self.surveyors + self.regular + self.events
    }

    /// Number of tables that received a bulk status update this pass.
    pub fn tables_updated(&self) -> usize {
        [self.surveyors, self.regular, self.events]
            .iter()
            .filter(|count| **count > 0)
            .count()
    }
}

/// Run one reconciliation pass: collect pending ids per table, wait out
/// the simulated latency once, then issue one bulk update per non-empty
/// table. Offline is a no-op, not an error.
///
/// Per-table updates are independent units, not one cross-table
/// transaction: if a later table fails, earlier updates stay committed
/// and the error propagates. Connectivity is not re-checked after the
/// latency sleep; a pass runs to completion even if the signal flips
/// mid-flight.
pub async fn run_pass(store: &Store, online: bool, opts: SyncOptions) -> AppResult<PassSummary> {
    if !online {
        return Ok(PassSummary::default());
    }
    info!(target: "surveysync", event = "sync_pass_start");

    let pending_surveyors = store.pending_ids(SurveyTable::Surveyors).await?;
    let pending_regular = store.pending_ids(SurveyTable::RegularResponses).await?;
    let pending_events = store.pending_ids(SurveyTable::EventResponses).await?;

    tokio::time::sleep(opts.latency).await;

    let mut summary = PassSummary::default();
    if !pending_surveyors.is_empty() {
        store
            .mark_synced(SurveyTable::Surveyors, &pending_surveyors)
            .await?;
        summary.surveyors = pending_surveyors.len();
        info!(
            target: "surveysync",
            event = "table_synced",
            table = SurveyTable::Surveyors.table_name(),
            count = summary.surveyors
        );
    }
    if !pending_regular.is_empty() {
        store
            .mark_synced(SurveyTable::RegularResponses, &pending_regular)
            .await?;
        summary.regular = pending_regular.len();
        info!(
            target: "surveysync",
            event = "table_synced",
            table = SurveyTable::RegularResponses.table_name(),
            count = summary.regular
        );
    }
    if !pending_events.is_empty() {
        store
            .mark_synced(SurveyTable::EventResponses, &pending_events)
            .await?;
        summary.events = pending_events.len();
        info!(
            target: "surveysync",
            event = "table_synced",
            table = SurveyTable::EventResponses.table_name(),
            count = summary.events
        );
    }

    info!(target: "surveysync", event = "sync_pass_complete", total = summary.total());
    Ok(summary)
}

/// Background reconciliation worker. Event-driven, no timer: it runs a
/// pass whenever the session flags change (or on spawn) while
/// connectivity, authentication, and store readiness all hold. A failed
/// pass is logged and waits for the next natural trigger; there is no
/// retry or backoff.
pub fn spawn_sync_worker(state: AppState, opts: SyncOptions) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut flags_rx = state.subscribe();
        loop {
            let flags = *flags_rx.borrow_and_update();
            if flags.sync_eligible() {
                if let Err(err) = run_pass(state.store(), flags.online, opts).await {
                    error!(target: "surveysync", event = "sync_pass_failed", error = %err);
                }
            }
            if flags_rx.changed().await.is_err() {
                break;
            }
        }
    })
}
