use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::AppResult;
use crate::model::SyncStatus;
use crate::state::AppState;
use crate::store::{Store, SurveyTable};
use crate::time::start_of_today_ms;

/// Records across all three tables still awaiting reconciliation. The
/// three counts are issued together and joined.
pub async fn pending_count(store: &Store) -> AppResult<i64> {
    let (surveyors, regular, events) = futures::try_join!(
        store.count_by_status(SurveyTable::Surveyors, SyncStatus::Pending),
        store.count_by_status(SurveyTable::RegularResponses, SyncStatus::Pending),
        store.count_by_status(SurveyTable::EventResponses, SyncStatus::Pending),
    )?;
    Ok(surveyors + regular + events)
}

/// Records created since the start of the current local day.
pub async fn submissions_today(store: &Store) -> AppResult<i64> {
    let since = start_of_today_ms();
    let (surveyors, regular, events) = futures::try_join!(
        store.count_created_since(SurveyTable::Surveyors, since),
        store.count_created_since(SurveyTable::RegularResponses, since),
        store.count_created_since(SurveyTable::EventResponses, since),
    )?;
    Ok(surveyors + regular + events)
}

/// Reactive handles on the dashboard counts. Receivers read 0 until the
/// session can touch storage, and keep their last value if the
/// background task ends.
pub struct LiveCounts {
    pending: watch::Receiver<i64>,
    today: watch::Receiver<i64>,
    handle: JoinHandle<()>,
}

impl LiveCounts {
    pub fn pending(&self) -> watch::Receiver<i64> {
        self.pending.clone()
    }

    pub fn submissions_today(&self) -> watch::Receiver<i64> {
        self.today.clone()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

async fn recompute(store: &Store, pending_tx: &watch::Sender<i64>, today_tx: &watch::Sender<i64>) {
    // Query failures degrade to 0 instead of reaching subscribers.
    let pending = match pending_count(store).await {
        Ok(count) => count,
        Err(err) => {
            warn!(target: "surveysync", event = "live_pending_failed", error = %err);
            0
        }
    };
    let today = match submissions_today(store).await {
        Ok(count) => count,
        Err(err) => {
            warn!(target: "surveysync", event = "live_today_failed", error = %err);
            0
        }
    };
    pending_tx.send_replace(pending);
    today_tx.send_replace(today);
}

/// Spawn the task backing [`LiveCounts`]. It waits for authentication
/// and store readiness, computes both counts, then recomputes whenever
/// any table's change feed moves. Subscribers never manage invalidation
/// and never see an error.
pub fn spawn_live_counts(state: &AppState) -> LiveCounts {
    let (pending_tx, pending_rx) = watch::channel(0);
    let (today_tx, today_rx) = watch::channel(0);
    let state = state.clone();
    let handle = tokio::spawn(async move {
        let mut flags_rx = state.subscribe();
        loop {
            if flags_rx.borrow_and_update().reads_allowed() {
                break;
            }
            if flags_rx.changed().await.is_err() {
                return;
            }
        }

        let store = state.store().clone();
        let mut surveyors = store.changes().subscribe(SurveyTable::Surveyors);
        let mut regular = store.changes().subscribe(SurveyTable::RegularResponses);
        let mut events = store.changes().subscribe(SurveyTable::EventResponses);
        loop {
            recompute(&store, &pending_tx, &today_tx).await;
            tokio::select! {
                changed = surveyors.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                changed = regular.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                changed = events.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    });
    LiveCounts {
        pending: pending_rx,
        today: today_rx,
        handle,
    }
}
