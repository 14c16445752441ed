use axum::Json;
use utoipa::OpenApi;

use crate::handlers::chat;
use crate::routes::{health, messages, sheets, threads, SuccessResponse};

#[derive(OpenApi)]
#[openapi(
    info(title = "Sheetchat API", description = "Spreadsheet chat assistant"),
    paths(
        health::health_check,
        chat::chat_stream,
        chat::chat_complete,
        threads::list_threads,
        threads::create_thread,
        threads::get_thread,
        threads::update_thread,
        threads::delete_thread,
        messages::create_message,
        messages::delete_message,
        messages::list_messages,
        sheets::list_sheets,
    ),
    components(schemas(
        health::HealthResponse,
        chat::ChatRequestBody,
        chat::CompletionResponse,
        threads::ThreadTitleRequest,
        threads::ThreadResponse,
        messages::CreateMessageRequest,
        messages::MessageResponse,
        sheets::SheetsResponse,
        SuccessResponse,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "chat", description = "Tool-calling chat relay"),
        (name = "threads", description = "Conversation threads"),
        (name = "messages", description = "Stored messages"),
        (name = "workbook", description = "Spreadsheet metadata"),
    )
)]
pub struct ApiDoc;

/// OpenAPI document for every route
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
