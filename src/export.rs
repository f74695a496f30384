use std::io::Write;

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::model::{EventSurveyResponse, RegularSurveyResponse, Surveyor, SyncStatus};
use crate::store::Store;
use crate::time::{local_day_end_ms, local_day_start_ms, now_ms, to_utc};

pub const CSV_HEADER: &str = "type,id,status,createdAt,data";

/// Reporting window over creation timestamps. Both bounds are whole local
/// days and inclusive; an absent start falls back to the epoch, an absent
/// end to now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ExportWindow {
    /// Resolve to inclusive millisecond bounds. The end bound lands on
    /// 23:59:59.999 local time so same-day records are never excluded.
    pub fn resolve(&self) -> (i64, i64) {
        let start = self.start.map(local_day_start_ms).unwrap_or(0);
        let end = self.end.map(local_day_end_ms).unwrap_or_else(now_ms);
        (start, end)
    }
}

/// Point-in-time snapshot of all three tables for a window. Not
/// reactive; computed once per explicit request.
#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    pub surveyors: Vec<Surveyor>,
    pub regular: Vec<RegularSurveyResponse>,
    pub events: Vec<EventSurveyResponse>,
}

impl ExportBundle {
    pub fn len(&self) -> usize {
        self.surveyors.len() + self.regular.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub async fn collect(store: &Store, window: ExportWindow) -> AppResult<ExportBundle> {
    let (start, end) = window.resolve();
    let surveyors = store.surveyors_in_range(start, end).await?;
    let regular = store.regular_responses_in_range(start, end).await?;
    let events = store.event_responses_in_range(start, end).await?;
    Ok(ExportBundle {
        surveyors,
        regular,
        events,
    })
}

fn csv_row<W: Write, T: Serialize>(
    out: &mut W,
    kind: &str,
    id: i64,
    status: SyncStatus,
    created_at: i64,
    record: &T,
) -> AppResult<()> {
    let created = to_utc(created_at).to_rfc3339_opts(SecondsFormat::Millis, true);
    let data = serde_json::to_string(record)
        .map_err(AppError::from)?
        .replace('"', "\"\"");
    writeln!(out, "{kind},{id},{status},{created},\"{data}\"").map_err(AppError::from)
}

/// Serialize a bundle as CSV: one row per record, the full record as a
/// quoted JSON payload in the last column.
pub fn write_csv<W: Write>(bundle: &ExportBundle, mut out: W) -> AppResult<()> {
    writeln!(out, "{CSV_HEADER}").map_err(AppError::from)?;
    for s in &bundle.surveyors {
        csv_row(&mut out, "surveyor", s.id, s.status, s.created_at, s)?;
    }
    for r in &bundle.regular {
        csv_row(&mut out, "regular_survey", r.id, r.status, r.created_at, r)?;
    }
    for e in &bundle.events {
        csv_row(&mut out, "event_survey", e.id, e.status, e.created_at, e)?;
    }
    Ok(())
}

/// Default report file name, stamped with the current UTC date.
pub fn default_file_name() -> String {
    format!("SurveySync_Report_{}.csv", Utc::now().format("%Y-%m-%d"))
}
