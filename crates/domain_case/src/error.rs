//! Case overview errors

use thiserror::Error;
use tracing::warn;

use core_kernel::{CaseId, PortError};

/// Errors that fail a case overview load
///
/// Degradable store errors (missing relationships, permission denials on
/// child collections, failed enrichment lookups) never reach this type; they
/// are absorbed where they occur.
#[derive(Debug, Error)]
pub enum CaseLoadError {
    #[error("Case not found: {0}")]
    NotFound(CaseId),

    #[error("Failed to load {collection} for {case_id}: {source}")]
    QueryFailed {
        case_id: CaseId,
        collection: &'static str,
        #[source]
        source: PortError,
    },
}

impl CaseLoadError {
    pub fn query(case_id: CaseId, collection: &'static str, source: PortError) -> Self {
        CaseLoadError::QueryFailed {
            case_id,
            collection,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CaseLoadError::NotFound(_))
    }

    /// True when the store failure may clear up on a retry
    pub fn is_transient(&self) -> bool {
        match self {
            CaseLoadError::NotFound(_) => false,
            CaseLoadError::QueryFailed { source, .. } => source.is_transient(),
        }
    }

    /// Message suitable for showing to the person who opened the case
    pub fn user_message(&self) -> String {
        match self {
            CaseLoadError::NotFound(case_id) => format!(
                "Case {} could not be found. It may have been removed.",
                case_id.get()
            ),
            CaseLoadError::QueryFailed { .. } => {
                "The case could not be loaded right now. Please try again.".to_string()
            }
        }
    }
}

/// Treats a permission-denied child collection as empty
///
/// Any other error fails the load.
pub(crate) fn or_empty_on_denied<T>(
    result: Result<Vec<T>, PortError>,
    case_id: CaseId,
    collection: &'static str,
) -> Result<Vec<T>, CaseLoadError> {
    match result {
        Ok(rows) => Ok(rows),
        Err(error) if error.is_permission_denied() => {
            warn!(%case_id, collection, %error, "Access denied, rendering collection as empty");
            Ok(Vec::new())
        }
        Err(error) => Err(CaseLoadError::query(case_id, collection, error)),
    }
}
