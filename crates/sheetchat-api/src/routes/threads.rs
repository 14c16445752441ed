use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use sheetchat_persist::Thread;
use crate::{
    error::{ApiError, ApiResult},
    routes::SuccessResponse,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadTitleRequest {
    #[serde(default)]
    pub title: String,
}

impl ThreadTitleRequest {
    fn validated_title(&self) -> ApiResult<&str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::BadRequest("Title is required".to_string()));
        }
        Ok(title)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Thread> for ThreadResponse {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            title: thread.title,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}

/// List all threads, most recently updated first
#[utoipa::path(
    get,
    path = "/threads",
    responses(
        (status = 200, description = "List of threads", body = [ThreadResponse])
    ),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ThreadResponse>>> {
    let threads = state.persist.list_threads().await?;
    Ok(Json(threads.into_iter().map(ThreadResponse::from).collect()))
}

/// Create a new thread
#[utoipa::path(
    post,
    path = "/threads",
    request_body = ThreadTitleRequest,
    responses(
        (status = 201, description = "Thread created", body = ThreadResponse),
        (status = 400, description = "Title is required")
    ),
    tag = "threads"
)]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ThreadTitleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let Json(req) = payload?;
    let title = req.validated_title()?;
    let thread = state.persist.create_thread(title).await?;

    tracing::info!(thread_id = %thread.id, "Thread created");

    Ok((StatusCode::CREATED, Json(thread.into())))
}

/// Get a specific thread by ID
#[utoipa::path(
    get,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread details", body = ThreadResponse),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state
        .persist
        .get_thread(&thread_id)
        .await?
        .ok_or(ApiError::ThreadNotFound(thread_id))?;

    Ok(Json(thread.into()))
}

/// Rename a thread
#[utoipa::path(
    put,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    request_body = ThreadTitleRequest,
    responses(
        (status = 200, description = "Thread renamed", body = ThreadResponse),
        (status = 400, description = "Title is required"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    payload: Result<Json<ThreadTitleRequest>, JsonRejection>,
) -> ApiResult<Json<ThreadResponse>> {
    let Json(req) = payload?;
    let title = req.validated_title()?;
    let thread = state.persist.update_thread(&thread_id, title).await?;

    Ok(Json(thread.into()))
}

/// Delete a thread and all of its messages
#[utoipa::path(
    delete,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread deleted", body = SuccessResponse),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state.persist.delete_thread(&thread_id).await?;

    tracing::info!(thread_id = %thread_id, "Thread deleted");

    Ok(Json(SuccessResponse::ok()))
}
