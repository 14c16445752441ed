use serde::{Deserialize, Serialize};
use super::tool::ToolCall;

/// One chat turn, serialized exactly as the completions endpoint expects it
///
/// The same shape arrives from the browser, so request bodies deserialize
/// straight into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },

    #[serde(rename = "user")]
    Human {
        content: String,
    },

    #[serde(rename = "assistant")]
    AI {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },

    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    /// Assistant turn that only carries tool calls
    pub fn ai_with_tools(tool_calls: Vec<ToolCall>) -> Self {
        Self::AI {
            content: None,
            tool_calls: Some(tool_calls),
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::Human { content } | Self::Tool { content, .. } => {
                Some(content)
            }
            Self::AI { content, .. } => content.as_deref(),
        }
    }
}
