//! Case overview handlers

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use core_kernel::CaseId;
use domain_case::{CaseOverview, LoadState};

use crate::{error::ApiError, AppState};

/// Loads the overview of one case
///
/// Accepts a bare key (`101`) or the display form (`CASE-101`).
#[instrument(skip(state))]
pub async fn get_overview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CaseOverview>, ApiError> {
    let case_id: CaseId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a case id", id)))?;

    match state.pipeline.run(case_id).await {
        LoadState::Ready(overview) => Ok(Json(*overview)),
        LoadState::Failed(error) => Err(error.into()),
        LoadState::Loading => Err(ApiError::Internal("case load did not finish".to_string())),
    }
}
