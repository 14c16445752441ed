use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use sheetchat_llm::ProviderError;
use sheetchat_persist::PersistError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("OpenAI API key is not configured")]
    MissingApiKey,

    #[error("OpenAI API error: {status}")]
    Upstream { status: u16, details: Value },

    #[error("Persistence error: {0}")]
    Persist(PersistError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] sheetchat_workbook::WorkbookError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(id) => ApiError::ThreadNotFound(id),
            PersistError::MessageNotFound(id) => ApiError::MessageNotFound(id),
            other => ApiError::Persist(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    /// Malformed or badly typed JSON bodies are the caller's fault
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    /// Provider rejections keep their status, everything else is a 500
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<ProviderError>() {
            Some(provider) => ApiError::Upstream {
                status: provider.status,
                details: provider.details(),
            },
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::ThreadNotFound(_) | ApiError::MessageNotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            ApiError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            ApiError::MissingApiKey => {
                tracing::error!("Chat request rejected: OPENAI_API_KEY is not set");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": self.to_string(),
                        "hint": "Please set the OPENAI_API_KEY environment variable"
                    }),
                )
            }
            ApiError::Upstream { status, ref details } => {
                tracing::warn!(status, "Provider rejected chat request");
                let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (code, json!({ "error": self.to_string(), "details": details }))
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Storage error" }))
            }
            ApiError::Workbook(ref e) => {
                tracing::error!("Workbook error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Workbook error" }))
            }
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
