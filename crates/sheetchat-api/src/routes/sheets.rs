use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SheetsResponse {
    pub sheets: Vec<String>,
}

/// Names of the sheets in the workbook
#[utoipa::path(
    get,
    path = "/sheets",
    responses(
        (status = 200, description = "Sheet names", body = SheetsResponse)
    ),
    tag = "workbook"
)]
pub async fn list_sheets(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SheetsResponse>> {
    let workbook = state.workbook.clone();
    let sheets = tokio::task::spawn_blocking(move || workbook.sheet_names())
        .await
        .map_err(|e| ApiError::Internal(format!("workbook task failed: {}", e)))??;

    Ok(Json(SheetsResponse { sheets }))
}
