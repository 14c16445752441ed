use serde_json::{json, Value};
use sheetchat_llm::streaming::DONE_MARKER;

/// One outbound SSE payload of a relayed chat turn
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// Provider payload relayed verbatim
    Delta(String),

    /// Result of a locally executed tool call
    ToolResult { tool_name: String, result: Value },

    /// Terminal marker, emitted exactly once
    Done,
}

impl RelayEvent {
    /// Text for the SSE `data:` field
    pub fn to_sse_data(&self) -> String {
        match self {
            RelayEvent::Delta(payload) => payload.clone(),
            RelayEvent::ToolResult { tool_name, result } => json!({
                "type": "tool-result",
                "toolName": tool_name,
                "result": result,
            })
            .to_string(),
            RelayEvent::Done => DONE_MARKER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_payload() {
        let event = RelayEvent::ToolResult {
            tool_name: "readExcelRange".to_string(),
            result: json!({"success": true}),
        };
        let payload: Value = serde_json::from_str(&event.to_sse_data()).unwrap();
        assert_eq!(
            payload,
            json!({"type": "tool-result", "toolName": "readExcelRange", "result": {"success": true}})
        );
    }

    #[test]
    fn test_delta_and_done_payloads() {
        assert_eq!(RelayEvent::Delta("{\"x\":1}".to_string()).to_sse_data(), "{\"x\":1}");
        assert_eq!(RelayEvent::Done.to_sse_data(), "[DONE]");
    }
}
