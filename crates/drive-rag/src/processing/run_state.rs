//! Ingestion run state: Idle or Running, with an exclusive run guard

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::IngestionRun;

/// Shared ingestion status, owned by the application context
#[derive(Clone, Default)]
pub struct IngestionTracker {
    state: Arc<Mutex<IngestionRun>>,
}

impl IngestionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move Idle -> Running in one critical section.
    ///
    /// Fails with `Error::Conflict` and leaves the current run untouched when a
    /// run is already active. On success all counters are reset and the
    /// previous error is cleared.
    pub fn try_begin(&self) -> Result<RunGuard> {
        let mut state = self.state.lock();
        if state.is_ingesting {
            return Err(Error::Conflict(format!(
                "Ingestion already in progress ({}/{} files)",
                state.processed_files, state.total_files
            )));
        }

        let run_id = Uuid::new_v4();
        *state = IngestionRun {
            is_ingesting: true,
            run_id: Some(run_id),
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        Ok(RunGuard {
            state: Arc::clone(&self.state),
            run_id,
        })
    }

    /// Copy of the latest published state
    pub fn snapshot(&self) -> IngestionRun {
        self.state.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_ingesting
    }
}

/// Exclusive handle on the active run. Dropping it returns the tracker to Idle.
pub struct RunGuard {
    state: Arc<Mutex<IngestionRun>>,
    run_id: Uuid,
}

impl RunGuard {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn set_total(&self, total: usize) {
        self.state.lock().total_files = total;
    }

    /// Mark `name` as the file being processed; `position` is 1-based
    pub fn begin_file(&self, position: usize, name: &str) {
        let mut state = self.state.lock();
        state.processed_files = position;
        state.current_file = Some(name.to_string());
    }

    pub fn record_indexed(&self, chunks: usize) {
        self.state.lock().chunks_indexed += chunks;
    }

    pub fn record_skipped(&self) {
        self.state.lock().skipped_files += 1;
    }

    pub fn record_failed(&self) {
        self.state.lock().failed_files += 1;
    }

    pub fn set_error(&self, error: impl Into<String>) {
        self.state.lock().error = Some(error.into());
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.state.lock().message = Some(message.into());
    }

    pub fn snapshot(&self) -> IngestionRun {
        self.state.lock().clone()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.is_ingesting = false;
        state.current_file = None;
        state.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_conflicts_without_touching_counters() {
        let tracker = IngestionTracker::new();
        let guard = tracker.try_begin().unwrap();
        guard.set_total(3);
        guard.begin_file(2, "Budget");

        let err = tracker.try_begin().err().unwrap();
        assert!(matches!(err, Error::Conflict(_)));

        let status = tracker.snapshot();
        assert!(status.is_ingesting);
        assert_eq!(status.total_files, 3);
        assert_eq!(status.processed_files, 2);
        assert_eq!(status.run_id, Some(guard.run_id()));
    }

    #[test]
    fn test_drop_returns_to_idle_and_keeps_error() {
        let tracker = IngestionTracker::new();
        {
            let guard = tracker.try_begin().unwrap();
            guard.begin_file(1, "Notes");
            guard.set_error("listing failed");
        }

        let status = tracker.snapshot();
        assert!(!status.is_ingesting);
        assert!(status.current_file.is_none());
        assert!(status.finished_at.is_some());
        assert_eq!(status.error.as_deref(), Some("listing failed"));
    }

    #[test]
    fn test_new_run_resets_state() {
        let tracker = IngestionTracker::new();
        {
            let guard = tracker.try_begin().unwrap();
            guard.set_total(5);
            guard.record_failed();
            guard.set_error("boom");
        }

        let _guard = tracker.try_begin().unwrap();
        let status = tracker.snapshot();
        assert!(status.is_ingesting);
        assert_eq!(status.total_files, 0);
        assert_eq!(status.failed_files, 0);
        assert!(status.error.is_none());
        assert!(status.finished_at.is_none());
    }

    #[test]
    fn test_guard_released_on_panic() {
        let tracker = IngestionTracker::new();
        let cloned = tracker.clone();
        let result = std::thread::spawn(move || {
            let _guard = cloned.try_begin().unwrap();
            panic!("worker crashed");
        })
        .join();

        assert!(result.is_err());
        assert!(!tracker.is_running());
        assert!(tracker.try_begin().is_ok());
    }
}
