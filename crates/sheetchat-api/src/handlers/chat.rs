use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use utoipa::ToSchema;

use sheetchat_llm::Message;
use sheetchat_persist::{MessageRole, NewMessage, ToolInvocation};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    /// Conversation so far, oldest first, as `{role, content}` objects
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ChatRequestBody {
    fn validate(self) -> ApiResult<(Vec<Message>, String)> {
        let items = match self.messages {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => return Err(ApiError::BadRequest("Messages array is required".to_string())),
        };

        let thread_id = match self.thread_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(ApiError::BadRequest("Thread ID is required".to_string())),
        };

        let messages = items
            .into_iter()
            .map(serde_json::from_value::<Message>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::BadRequest(format!("Invalid message: {}", e)))?;

        Ok((messages, thread_id))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub role: String,
    pub content: String,
    #[schema(value_type = Vec<Object>)]
    pub tool_invocations: Vec<ToolInvocation>,
}

/// Relay a chat turn as Server-Sent Events
///
/// Each `data:` payload is either a provider chunk passed through verbatim,
/// a `{"type":"tool-result","toolName":..,"result":..}` object, or the final
/// `[DONE]`.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Streaming response", content_type = "text/event-stream"),
        (status = 400, description = "Missing messages or thread id"),
        (status = 500, description = "Provider key not configured")
    ),
    tag = "chat"
)]
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Json(body) = payload?;
    // 1. Validate request
    let (messages, thread_id) = body.validate()?;

    // 2. Save the user's message (failures don't block the turn)
    save_user_message(&state, &thread_id, &messages).await;

    // 3. Provider must be configured
    let relay = state.relay()?;

    // 4. Open the upstream stream; a rejection here keeps the provider status
    let events = relay.start(messages).await?;

    // 5. Convert relay events to SSE events
    let sse_stream = events.map(|event| Ok::<Event, Infallible>(Event::default().data(event.to_sse_data())));

    Ok(Sse::new(sse_stream))
}

/// Run a whole chat turn and answer with the final assistant message
#[utoipa::path(
    post,
    path = "/chat/complete",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Assistant answer", body = CompletionResponse),
        (status = 400, description = "Missing messages or thread id"),
        (status = 500, description = "Provider key not configured")
    ),
    tag = "chat"
)]
pub async fn chat_complete(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> ApiResult<Json<CompletionResponse>> {
    let Json(body) = payload?;
    let (messages, _thread_id) = body.validate()?;
    let relay = state.relay()?;

    let completion = relay.complete(messages).await?;

    Ok(Json(CompletionResponse {
        role: "assistant".to_string(),
        content: completion.content,
        tool_invocations: completion.tool_invocations,
    }))
}

async fn save_user_message(state: &AppState, thread_id: &str, messages: &[Message]) {
    let Some(last) = messages.last() else {
        return;
    };
    if last.role() != "user" {
        return;
    }

    let content = last.text().unwrap_or_default();
    let message = NewMessage::new(thread_id, MessageRole::User, content);

    if let Err(e) = state.persist.create_message(message).await {
        tracing::error!(thread_id = %thread_id, "Failed to save user message: {}", e);
    }
}
