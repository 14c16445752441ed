use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use sheetchat_persist::{Message, MessageRole, NewMessage, ToolInvocation};
use crate::{
    error::{ApiError, ApiResult},
    routes::SuccessResponse,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub tool_invocations: Option<Vec<ToolInvocation>>,
}

impl CreateMessageRequest {
    fn into_new_message(self) -> ApiResult<NewMessage> {
        let (thread_id, role, content) = match (self.thread_id, self.role, self.content) {
            (Some(t), Some(r), Some(c)) if !t.is_empty() && !r.is_empty() && !c.is_empty() => (t, r, c),
            _ => {
                return Err(ApiError::BadRequest(
                    "threadId, role, and content are required".to_string(),
                ))
            }
        };

        let role: MessageRole = role
            .parse()
            .map_err(|_| ApiError::BadRequest("Invalid role".to_string()))?;

        let message = NewMessage::new(thread_id, role, content);
        Ok(match self.tool_invocations {
            Some(invocations) => message.with_tool_invocations(invocations),
            None => message,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub thread_id: String,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub tool_invocations: Option<Vec<ToolInvocation>>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            thread_id: message.thread_id,
            role: message.role.to_string(),
            content: message.content,
            tool_invocations: message.tool_invocations,
            created_at: message.created_at,
        }
    }
}

/// Store a message in a thread
#[utoipa::path(
    post,
    path = "/messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Missing field or invalid role"),
        (status = 404, description = "Thread not found")
    ),
    tag = "messages"
)]
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    let new_message = req.into_new_message()?;
    let message = state.persist.create_message(new_message).await?;

    tracing::debug!(message_id = %message.id, thread_id = %message.thread_id, "Message stored");

    Ok(Json(message.into()))
}

/// Delete a single message
#[utoipa::path(
    delete,
    path = "/messages/{message_id}",
    params(
        ("message_id" = String, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message deleted", body = SuccessResponse),
        (status = 404, description = "Message not found")
    ),
    tag = "messages"
)]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state.persist.delete_message(&message_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// List the messages of a thread in creation order
#[utoipa::path(
    get,
    path = "/threads/{thread_id}/messages",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Messages of the thread", body = [MessageResponse]),
        (status = 404, description = "Thread not found")
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    // 1. Check if thread exists
    if state.persist.get_thread(&thread_id).await?.is_none() {
        return Err(ApiError::ThreadNotFound(thread_id));
    }

    // 2. Load messages
    let messages = state.persist.get_messages(&thread_id).await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}
