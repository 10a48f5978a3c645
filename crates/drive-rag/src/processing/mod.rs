//! Background ingestion with run-state tracking

mod coordinator;
mod run_state;

pub use coordinator::{
    FileOutcome, IngestionCoordinator, IngestionHandle, RunSummary, NOTHING_TO_INGEST,
};
pub use run_state::{IngestionTracker, RunGuard};
