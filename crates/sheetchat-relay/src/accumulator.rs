use sheetchat_llm::types::FunctionCall;
use sheetchat_llm::{StreamEvent, ToolCall};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    tool_type: Option<String>,
    name: String,
    arguments: String,
}

/// Reassembles tool calls streamed as fragments keyed by the provider's index
///
/// The first fragment for an index seeds id and type; every fragment appends
/// to the name and the argument text.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PendingCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        index: u32,
        id: Option<String>,
        tool_type: Option<String>,
        name: Option<String>,
        arguments: Option<String>,
    ) {
        let entry = self.calls.entry(index).or_default();

        if entry.id.is_none() {
            entry.id = id;
        }
        if entry.tool_type.is_none() {
            entry.tool_type = tool_type;
        }
        if let Some(name) = name {
            entry.name.push_str(&name);
        }
        if let Some(arguments) = arguments {
            entry.arguments.push_str(&arguments);
        }
    }

    /// Merge a `ToolCall` stream event; returns whether it was one
    pub fn push_event(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::ToolCall {
                index,
                id,
                tool_type,
                name,
                arguments,
            } => {
                self.push(index, id, tool_type, name, arguments);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Drain the buffered calls in index order
    pub fn take(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.calls)
            .into_iter()
            .map(|(index, call)| ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{}", index)),
                tool_type: call.tool_type.unwrap_or_else(|| "function".to_string()),
                function: FunctionCall {
                    name: call.name,
                    arguments: call.arguments,
                },
            })
            .collect()
    }
}
