//! Case file - the root record of a legal matter

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{days_until, CaseId};

/// A legal matter handled by the firm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    /// Unique identifier
    pub id: CaseId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Case title shown in listings
    pub title: Option<String>,
    /// Workflow status (open, settled, closed, ...)
    pub status: String,
    /// Litigation stage (intake, treatment, demand, litigation, ...)
    pub stage: String,
    /// Date of the incident giving rise to the matter
    pub incident_date: Option<NaiveDate>,
    /// Statute of limitations filing deadline
    pub statute_deadline: Option<NaiveDate>,
    /// Days remaining until the statute deadline, derived on every load
    pub days_until_statute: Option<i64>,
}

impl CaseFile {
    /// Recomputes the statute countdown against `today`
    ///
    /// Returns the new value, or `None` when the case has no deadline, in
    /// which case the countdown is cleared.
    pub fn refresh_statute_countdown(&mut self, today: NaiveDate) -> Option<i64> {
        self.days_until_statute = self
            .statute_deadline
            .map(|deadline| days_until(deadline, today));
        self.days_until_statute
    }
}
