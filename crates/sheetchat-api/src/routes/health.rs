use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Returns the health status of the API and its dependencies
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<HealthResponse>> {
    let mut services = HashMap::new();

    let database_ok = state.persist.ping().await.is_ok();
    services.insert(
        "database".to_string(),
        if database_ok { "connected" } else { "disconnected" }.to_string(),
    );

    let workbook_ok = state.workbook.path().exists();
    services.insert(
        "workbook".to_string(),
        if workbook_ok { "available" } else { "missing" }.to_string(),
    );

    services.insert(
        "llm".to_string(),
        if state.relay.is_some() { "configured" } else { "unconfigured" }.to_string(),
    );

    let status = if database_ok { "healthy" } else { "degraded" };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}
