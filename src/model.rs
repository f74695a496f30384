use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unrecognized {field}: {value}")]
pub struct ParseFieldError {
    field: &'static str,
    value: String,
}

/// Per-record synchronization state. `Synced` is terminal; nothing ever
/// moves a record back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Synced,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "synced" => Ok(SyncStatus::Synced),
            other => Err(ParseFieldError {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
            Region::Central => "Central",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "North" => Ok(Region::North),
            "South" => Ok(Region::South),
            "East" => Ok(Region::East),
            "West" => Ok(Region::West),
            "Central" => Ok(Region::Central),
            other => Err(ParseFieldError {
                field: "region",
                value: other.to_string(),
            }),
        }
    }
}

/// One open question-key → answer mapping collected by a wizard step.
pub type StepAnswers = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Surveyor {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub region: Region,
    pub id_number: String,
    pub created_at: i64,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularSurveyResponse {
    pub id: i64,
    pub step1: StepAnswers,
    pub step2: StepAnswers,
    pub step3: StepAnswers,
    pub step4: StepAnswers,
    pub created_at: i64,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSurveyResponse {
    pub id: i64,
    pub event_date: String,
    pub location: String,
    pub step1: StepAnswers,
    pub step2: StepAnswers,
    pub step3: StepAnswers,
    pub created_at: i64,
    pub status: SyncStatus,
}

/// Registration form payload; id, creation timestamp, and status are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSurveyor {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub region: Region,
    pub id_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegularResponse {
    pub step1: StepAnswers,
    pub step2: StepAnswers,
    pub step3: StepAnswers,
    pub step4: StepAnswers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventResponse {
    pub event_date: String,
    pub location: String,
    pub step1: StepAnswers,
    pub step2: StepAnswers,
    pub step3: StepAnswers,
}

fn decode_column<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|err: T::Err| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    })
}

fn decode_step(row: &SqliteRow, column: &str) -> Result<StepAnswers, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|err| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    })
}

impl<'r> FromRow<'r, SqliteRow> for Surveyor {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Surveyor {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            region: decode_column(row, "region")?,
            id_number: row.try_get("id_number")?,
            created_at: row.try_get("created_at")?,
            status: decode_column(row, "status")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for RegularSurveyResponse {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(RegularSurveyResponse {
            id: row.try_get("id")?,
            step1: decode_step(row, "step1")?,
            step2: decode_step(row, "step2")?,
            step3: decode_step(row, "step3")?,
            step4: decode_step(row, "step4")?,
            created_at: row.try_get("created_at")?,
            status: decode_column(row, "status")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for EventSurveyResponse {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(EventSurveyResponse {
            id: row.try_get("id")?,
            event_date: row.try_get("event_date")?,
            location: row.try_get("location")?,
            step1: decode_step(row, "step1")?,
            step2: decode_step(row, "step2")?,
            step3: decode_step(row, "step3")?,
            created_at: row.try_get("created_at")?,
            status: decode_column(row, "status")?,
        })
    }
}
