use serde_json::Value;
use thiserror::Error;

/// Upstream rejected (or never answered) a chat completion request.
///
/// Carried inside `anyhow::Error` so callers can recover the provider status
/// with `downcast_ref::<ProviderError>()`.
#[derive(Debug, Clone, Error)]
#[error("OpenAI API error ({status}): {body}")]
pub struct ProviderError {
    pub status: u16,
    pub body: String,
}

impl ProviderError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Connection-level failure, reported as a bad gateway
    pub fn unreachable(reason: impl std::fmt::Display) -> Self {
        Self::new(502, reason.to_string())
    }

    /// Error body as JSON when the provider sent JSON, otherwise as a string
    pub fn details(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_json_body() {
        let err = ProviderError::new(401, r#"{"error":{"message":"bad key"}}"#);
        assert_eq!(err.details()["error"]["message"], "bad key");
    }

    #[test]
    fn test_details_plain_body() {
        let err = ProviderError::new(500, "upstream exploded");
        assert_eq!(err.details(), Value::String("upstream exploded".to_string()));
    }

    #[test]
    fn test_unreachable_is_bad_gateway() {
        let err = ProviderError::unreachable("connection refused");
        assert_eq!(err.status, 502);
        assert!(err.to_string().contains("connection refused"));
    }
}
