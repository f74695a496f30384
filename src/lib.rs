pub mod db;
pub mod error;
pub mod export;
pub mod live;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod state;
pub mod store;
pub mod sync;
pub mod time;

pub use db::StorageUnavailable;
pub use error::{AppError, AppResult};
pub use export::{ExportBundle, ExportWindow};
pub use live::{pending_count, spawn_live_counts, submissions_today, LiveCounts};
pub use model::{
    EventSurveyResponse, NewEventResponse, NewRegularResponse, NewSurveyor, Region,
    RegularSurveyResponse, Surveyor, SyncStatus,
};
pub use state::{AppState, SessionFlags};
pub use store::{ChangeFeed, Store, SurveyTable};
pub use sync::{run_pass, spawn_sync_worker, PassSummary, SyncOptions, SYNC_LATENCY};
