// OpenAI-compatible chat completions client

use crate::buffer_utils::parse_sse_frames;
use crate::error::ProviderError;
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, FrameStream};
use crate::types::{Message, ToolCall};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Point the client at an OpenAI-compatible gateway instead of api.openai.com
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build chat completion request payload
    pub(crate) fn build_chat_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> Result<Value> {
        let mut obj = Map::new();
        obj.insert("model".to_string(), Value::from(model));
        obj.insert("messages".to_string(), serde_json::to_value(messages)?);
        obj.insert("stream".to_string(), Value::Bool(stream));

        if let Some(tools) = &options.tools {
            obj.insert("tools".to_string(), serde_json::to_value(tools)?);
        }
        if let Some(tool_choice) = &options.tool_choice {
            obj.insert("tool_choice".to_string(), serde_json::to_value(tool_choice)?);
        }

        Ok(Value::Object(obj))
    }

    async fn post_completion(&self, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(payload)
            .send()
            .await
            .map_err(ProviderError::unreachable)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::new(status, error_text).into());
        }

        Ok(response)
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload =
            self.build_chat_request(&request.model, &request.messages, &request.options, false)?;

        let response = self.post_completion(&payload).await?;

        let completion: Completion = response
            .json()
            .await
            .context("Failed to parse response")?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .map(|choice| ChatResponse {
                content: choice.message.content,
                tool_calls: choice.message.tool_calls,
            })
            .unwrap_or_default())
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<FrameStream> {
        let payload =
            self.build_chat_request(&request.model, &request.messages, &request.options, true)?;

        let response = self.post_completion(&payload).await?;

        Ok(parse_sse_frames(response.bytes_stream()))
    }
}

/// The slice of a completions response the relay reads
#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FunctionCall, Tool, ToolChoice};

    fn client() -> OpenAIClient {
        OpenAIClient::new("sk-test").unwrap()
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let client = client().with_base_url("http://localhost:9000/v1/");
        assert_eq!(client.base_url(), "http://localhost:9000/v1");
    }

    #[test]
    fn test_payload_omits_unset_options() {
        let payload = client()
            .build_chat_request("gpt-4o", &[Message::human("hi")], &ChatOptions::new(), true)
            .unwrap();

        assert_eq!(payload["stream"], true);
        assert!(payload.get("tools").is_none());
        assert!(payload.get("tool_choice").is_none());
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_payload_with_tools_and_auto_choice() {
        let options = ChatOptions::new()
            .tools(vec![Tool::new("readExcelRange", "Read cells", serde_json::json!({"type": "object"}))])
            .tool_choice(ToolChoice::Auto);

        let payload = client()
            .build_chat_request("gpt-4o", &[Message::human("hi")], &options, true)
            .unwrap();

        assert_eq!(payload["tool_choice"], "auto");
        assert_eq!(payload["tools"][0]["function"]["name"], "readExcelRange");
    }

    #[test]
    fn test_tool_round_trip_messages() {
        let call = ToolCall {
            id: "call_1".to_string(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: "readExcelRange".to_string(),
                arguments: r#"{"range":"Sheet1!A1:B2"}"#.to_string(),
            },
        };
        let messages = vec![
            Message::ai_with_tools(vec![call]),
            Message::tool_result("call_1", r#"{"success":true}"#),
        ];

        let payload = client()
            .build_chat_request("gpt-4o", &messages, &ChatOptions::new(), true)
            .unwrap();

        let assistant = &payload["messages"][0];
        assert_eq!(assistant["role"], "assistant");
        assert!(assistant.get("content").is_none());
        assert_eq!(assistant["tool_calls"][0]["id"], "call_1");
        assert_eq!(assistant["tool_calls"][0]["type"], "function");

        let tool = &payload["messages"][1];
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_1");
        assert_eq!(tool["content"], r#"{"success":true}"#);
    }
}
