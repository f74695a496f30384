use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::watch;

use crate::db::{self, StorageUnavailable};
use crate::error::{AppError, AppResult};
use crate::migrate;
use crate::model::{
    EventSurveyResponse, NewEventResponse, NewRegularResponse, NewSurveyor,
    RegularSurveyResponse, Surveyor, SyncStatus,
};
use crate::time::now_ms;

/// The three record tables. Every record lives in exactly one of them;
/// there is no cross-table identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyTable {
    Surveyors,
    RegularResponses,
    EventResponses,
}

impl SurveyTable {
    pub fn table_name(self) -> &'static str {
        match self {
            SurveyTable::Surveyors => "surveyors",
            SurveyTable::RegularResponses => "survey_regular_responses",
            SurveyTable::EventResponses => "survey_event_responses",
        }
    }
}

struct ChangeFeedInner {
    surveyors: watch::Sender<u64>,
    regular: watch::Sender<u64>,
    events: watch::Sender<u64>,
}

/// Per-table version counters behind watch channels. Derived queries
/// subscribe and recompute when a table's counter moves, instead of
/// polling the store.
#[derive(Clone)]
pub struct ChangeFeed {
    inner: Arc<ChangeFeedInner>,
}

impl ChangeFeed {
    fn new() -> Self {
        let (surveyors, _) = watch::channel(0);
        let (regular, _) = watch::channel(0);
        let (events, _) = watch::channel(0);
        ChangeFeed {
            inner: Arc::new(ChangeFeedInner {
                surveyors,
                regular,
                events,
            }),
        }
    }

    fn sender(&self, table: SurveyTable) -> &watch::Sender<u64> {
        match table {
            SurveyTable::Surveyors => &self.inner.surveyors,
            SurveyTable::RegularResponses => &self.inner.regular,
            SurveyTable::EventResponses => &self.inner.events,
        }
    }

    pub fn bump(&self, table: SurveyTable) {
        self.sender(table).send_modify(|version| *version += 1);
    }

    pub fn subscribe(&self, table: SurveyTable) -> watch::Receiver<u64> {
        self.sender(table).subscribe()
    }
}

/// Durable keyed storage for the three record types. The store is the
/// only writer; submissions are append-only and only the status column
/// is ever updated after creation.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl Store {
    /// Open (or create) the database at `db_path` and bring the schema up
    /// to date. Failure here is fatal at the process level.
    pub async fn open(db_path: &Path) -> Result<Store, StorageUnavailable> {
        let pool = db::open_sqlite_pool(db_path).await?;
        migrate::apply_migrations(&pool)
            .await
            .map_err(StorageUnavailable::Migrate)?;
        Ok(Store::from_pool(pool))
    }

    /// Wrap an already-migrated pool. Used by tests running on
    /// `sqlite::memory:`.
    pub fn from_pool(pool: SqlitePool) -> Store {
        Store {
            pool,
            changes: ChangeFeed::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    pub async fn create_surveyor(
        &self,
        input: NewSurveyor,
        status: SyncStatus,
    ) -> AppResult<i64> {
        let res = sqlx::query(
            "INSERT INTO surveyors (full_name, email, phone_number, region, id_number, created_at, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(input.region.as_str())
        .bind(&input.id_number)
        .bind(now_ms())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            AppError::from(err)
                .with_context("operation", "create")
                .with_context("table", SurveyTable::Surveyors.table_name())
        })?;
        self.changes.bump(SurveyTable::Surveyors);
        Ok(res.last_insert_rowid())
    }

    pub async fn create_regular_response(
        &self,
        input: NewRegularResponse,
        status: SyncStatus,
    ) -> AppResult<i64> {
        let steps = [&input.step1, &input.step2, &input.step3, &input.step4]
            .map(serde_json::to_string);
        let [step1, step2, step3, step4] = steps;
        let res = sqlx::query(
            "INSERT INTO survey_regular_responses (step1, step2, step3, step4, created_at, status) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(step1.map_err(AppError::from)?)
        .bind(step2.map_err(AppError::from)?)
        .bind(step3.map_err(AppError::from)?)
        .bind(step4.map_err(AppError::from)?)
        .bind(now_ms())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            AppError::from(err)
                .with_context("operation", "create")
                .with_context("table", SurveyTable::RegularResponses.table_name())
        })?;
        self.changes.bump(SurveyTable::RegularResponses);
        Ok(res.last_insert_rowid())
    }

    pub async fn create_event_response(
        &self,
        input: NewEventResponse,
        status: SyncStatus,
    ) -> AppResult<i64> {
        let steps = [&input.step1, &input.step2, &input.step3].map(serde_json::to_string);
        let [step1, step2, step3] = steps;
        let res = sqlx::query(
            "INSERT INTO survey_event_responses (event_date, location, step1, step2, step3, created_at, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.event_date)
        .bind(&input.location)
        .bind(step1.map_err(AppError::from)?)
        .bind(step2.map_err(AppError::from)?)
        .bind(step3.map_err(AppError::from)?)
        .bind(now_ms())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            AppError::from(err)
                .with_context("operation", "create")
                .with_context("table", SurveyTable::EventResponses.table_name())
        })?;
        self.changes.bump(SurveyTable::EventResponses);
        Ok(res.last_insert_rowid())
    }

    /// Ids of records awaiting reconciliation. Order is not guaranteed.
    pub async fn pending_ids(&self, table: SurveyTable) -> AppResult<Vec<i64>> {
        let sql = format!(
            "SELECT id FROM {} WHERE status = ?",
            table.table_name()
        );
        sqlx::query_scalar(&sql)
            .bind(SyncStatus::Pending.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "pending_ids")
                    .with_context("table", table.table_name())
            })
    }

    /// Flip the given records to `synced`. One UPDATE per call; atomic for
    /// the table, independent of any other table. Returns the number of
    /// rows touched.
    pub async fn mark_synced(&self, table: SurveyTable, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE {} SET status = ? WHERE id IN ({placeholders})",
            table.table_name()
        );
        let mut query = sqlx::query(&sql).bind(SyncStatus::Synced.as_str());
        for id in ids {
            query = query.bind(*id);
        }
        let res = query.execute(&self.pool).await.map_err(|err| {
            AppError::from(err)
                .with_context("operation", "mark_synced")
                .with_context("table", table.table_name())
        })?;
        if res.rows_affected() > 0 {
            self.changes.bump(table);
        }
        Ok(res.rows_affected())
    }

    /// Count records by status without materializing them.
    pub async fn count_by_status(
        &self,
        table: SurveyTable,
        status: SyncStatus,
    ) -> AppResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE status = ?",
            table.table_name()
        );
        sqlx::query_scalar(&sql)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "count_by_status")
                    .with_context("table", table.table_name())
            })
    }

    /// Count records created at or after `since_ms`.
    pub async fn count_created_since(
        &self,
        table: SurveyTable,
        since_ms: i64,
    ) -> AppResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE created_at >= ?",
            table.table_name()
        );
        sqlx::query_scalar(&sql)
            .bind(since_ms)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "count_created_since")
                    .with_context("table", table.table_name())
            })
    }

    /// Surveyors with `created_at` in `[start_ms, end_ms]`, both bounds
    /// inclusive.
    pub async fn surveyors_in_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> AppResult<Vec<Surveyor>> {
        sqlx::query_as::<_, Surveyor>(
            "SELECT id, full_name, email, phone_number, region, id_number, created_at, status \
             FROM surveyors WHERE created_at BETWEEN ? AND ? ORDER BY created_at, id",
        )
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            AppError::from(err)
                .with_context("operation", "range")
                .with_context("table", SurveyTable::Surveyors.table_name())
        })
    }

    pub async fn regular_responses_in_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> AppResult<Vec<RegularSurveyResponse>> {
        sqlx::query_as::<_, RegularSurveyResponse>(
            "SELECT id, step1, step2, step3, step4, created_at, status \
             FROM survey_regular_responses WHERE created_at BETWEEN ? AND ? ORDER BY created_at, id",
        )
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            AppError::from(err)
                .with_context("operation", "range")
                .with_context("table", SurveyTable::RegularResponses.table_name())
        })
    }

    pub async fn event_responses_in_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> AppResult<Vec<EventSurveyResponse>> {
        sqlx::query_as::<_, EventSurveyResponse>(
            "SELECT id, event_date, location, step1, step2, step3, created_at, status \
             FROM survey_event_responses WHERE created_at BETWEEN ? AND ? ORDER BY created_at, id",
        )
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            AppError::from(err)
                .with_context("operation", "range")
                .with_context("table", SurveyTable::EventResponses.table_name())
        })
    }
}
