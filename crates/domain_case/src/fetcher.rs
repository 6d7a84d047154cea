//! Case record fetcher
//!
//! Loads the root case file and refreshes its statute countdown. The fresh
//! countdown is persisted on a detached task so the read path never waits on
//! the write.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use core_kernel::CaseId;

use crate::case_file::CaseFile;
use crate::error::CaseLoadError;
use crate::ports::CaseStorePort;

/// A loaded case file with its pending countdown write-back
#[derive(Debug)]
pub struct FetchedCase {
    /// The case with `days_until_statute` computed for this load
    pub case_file: CaseFile,
    /// Persistence of the countdown, `None` when the case has no deadline.
    /// Dropping the handle detaches the task.
    pub write_back: Option<JoinHandle<()>>,
}

/// Loads exactly one case file
pub struct CaseRecordFetcher {
    store: Arc<dyn CaseStorePort>,
}

impl CaseRecordFetcher {
    pub fn new(store: Arc<dyn CaseStorePort>) -> Self {
        Self { store }
    }

    /// Loads a case and recomputes its statute countdown against `today`
    ///
    /// # Errors
    ///
    /// `CaseLoadError::NotFound` when the case does not exist, and
    /// `CaseLoadError::QueryFailed` when the store cannot be read.
    pub async fn fetch(&self, case_id: CaseId, today: NaiveDate) -> Result<FetchedCase, CaseLoadError> {
        let mut case_file = match self.store.find_case_file(case_id).await {
            Ok(Some(case_file)) => case_file,
            Ok(None) => return Err(CaseLoadError::NotFound(case_id)),
            Err(e) if e.is_not_found() => return Err(CaseLoadError::NotFound(case_id)),
            Err(e) => return Err(CaseLoadError::query(case_id, "casefiles", e)),
        };

        let write_back = case_file
            .refresh_statute_countdown(today)
            .map(|days| self.spawn_write_back(case_id, days));

        debug!(
            %case_id,
            days_until_statute = ?case_file.days_until_statute,
            "Case file loaded"
        );

        Ok(FetchedCase {
            case_file,
            write_back,
        })
    }

    fn spawn_write_back(&self, case_id: CaseId, days: i64) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.update_days_until_statute(case_id, days).await {
                Ok(()) => debug!(%case_id, days, "Statute countdown persisted"),
                Err(error) => warn!(%case_id, days, %error, "Failed to persist statute countdown"),
            }
        })
    }
}
