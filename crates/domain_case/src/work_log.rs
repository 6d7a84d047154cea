//! Case activity log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, WorkLogId};

/// One entry in a case's activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLogEntry {
    pub id: WorkLogId,
    pub case_id: CaseId,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Staff member who performed the activity
    pub actor: Option<String>,
}
