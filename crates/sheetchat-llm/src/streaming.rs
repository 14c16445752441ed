use serde::{Deserialize, Serialize};

/// Provider-agnostic view of one streamed delta
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Message {
        content: String,
    },

    ToolCall {
        index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        arguments: Option<String>,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

/// One `data:` event read off the upstream stream.
///
/// `data` is always the payload exactly as received so relays can forward it
/// without re-serializing.
#[derive(Debug, Clone)]
pub enum SseFrame {
    /// Payload parsed as a chat completion chunk
    Chunk {
        data: String,
        chunk: ChatStreamChunk,
    },

    /// Payload that is not a chat completion chunk (provider control events,
    /// malformed JSON)
    Raw {
        data: String,
    },

    /// The `[DONE]` sentinel
    Done,
}

pub const DONE_MARKER: &str = "[DONE]";

impl SseFrame {
    pub fn from_data(data: &str) -> Self {
        if data == DONE_MARKER {
            return SseFrame::Done;
        }

        match serde_json::from_str::<ChatStreamChunk>(data) {
            Ok(chunk) => SseFrame::Chunk {
                data: data.to_string(),
                chunk,
            },
            Err(e) => {
                tracing::debug!("Unparsed upstream payload ({}): {}", e, data);
                SseFrame::Raw {
                    data: data.to_string(),
                }
            }
        }
    }

    pub fn data(&self) -> &str {
        match self {
            SseFrame::Chunk { data, .. } | SseFrame::Raw { data } => data,
            SseFrame::Done => DONE_MARKER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub tool_type: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }

    /// The turn ended because the model wants its tool calls executed
    pub fn requests_tools(&self) -> bool {
        self.finish_reason() == Some("tool_calls")
    }

    pub fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Message {
                        content: content.clone(),
                    });
                }
            }

            if let Some(tool_calls) = &choice.delta.tool_calls {
                for tc in tool_calls {
                    events.push(StreamEvent::ToolCall {
                        index: tc.index,
                        id: tc.id.clone(),
                        tool_type: tc.tool_type.clone(),
                        name: tc.function.as_ref().and_then(|f| f.name.clone()),
                        arguments: tc.function.as_ref().and_then(|f| f.arguments.clone()),
                    });
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}
