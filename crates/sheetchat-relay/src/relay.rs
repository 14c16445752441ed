//! Streaming tool-call relay
//!
//! Proxies one chat turn to the provider, re-emitting its SSE payloads while
//! reassembling tool-call fragments. When the provider finishes a turn with
//! `finish_reason == "tool_calls"` the buffered calls run locally, their
//! results go out as `tool-result` events, and a follow-up completion carrying
//! those results is streamed in place of the consumed finish chunk.

use anyhow::Result;
use async_stream::stream;
use futures::{Stream, StreamExt};
use sheetchat_llm::{
    ChatClient, ChatOptions, ChatRequest, FrameStream, Message, SseFrame, Tool, ToolCall,
    ToolChoice,
};
use sheetchat_persist::{ToolInvocation, ToolInvocationState};
use std::pin::Pin;
use std::sync::Arc;

use crate::accumulator::ToolCallAccumulator;
use crate::tools::{registry, ToolExecutor};
use crate::types::{RelayEvent, RelayPhase};

pub type RelayStream = Pin<Box<dyn Stream<Item = RelayEvent> + Send>>;

/// Final answer of a non-streaming chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub tool_invocations: Vec<ToolInvocation>,
}

pub struct ChatRelay {
    client: Arc<dyn ChatClient>,
    executor: Arc<dyn ToolExecutor>,
    model: String,
    tools: Vec<Tool>,
}

impl ChatRelay {
    pub fn new(
        client: Arc<dyn ChatClient>,
        executor: Arc<dyn ToolExecutor>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            executor,
            model: model.into(),
            tools: registry(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn tool_request(&self, messages: Vec<Message>) -> ChatRequest {
        let options = ChatOptions::new()
            .tools(self.tools.clone())
            .tool_choice(ToolChoice::Auto);

        ChatRequest::new(self.model.clone(), messages).with_options(options)
    }

    /// Open the upstream stream and relay it
    ///
    /// A rejected initial request is returned as the error (carrying a
    /// `ProviderError`); once the stream exists it always ends with exactly one
    /// `RelayEvent::Done`.
    pub async fn start(&self, messages: Vec<Message>) -> Result<RelayStream> {
        tracing::info!(
            model = %self.model,
            messages = messages.len(),
            "Starting relayed chat turn"
        );

        let upstream = self.client.chat_stream(self.tool_request(messages.clone())).await?;

        Ok(Box::pin(relay_turn(
            upstream,
            messages,
            Arc::clone(&self.client),
            Arc::clone(&self.executor),
            self.model.clone(),
        )))
    }

    /// Non-streaming chat turn with the same tools
    pub async fn complete(&self, messages: Vec<Message>) -> Result<Completion> {
        let response = self.client.chat(self.tool_request(messages.clone())).await?;

        let calls = match response.tool_calls {
            Some(calls) if !calls.is_empty() => calls,
            _ => {
                return Ok(Completion {
                    content: response.content.unwrap_or_default(),
                    tool_invocations: Vec::new(),
                })
            }
        };

        let mut tool_messages = Vec::with_capacity(calls.len());
        let mut invocations = Vec::with_capacity(calls.len());
        for call in &calls {
            let result = self
                .executor
                .execute(&call.function.name, &call.function.arguments)
                .await;

            tool_messages.push(Message::tool_result(call.id.clone(), result.to_string()));
            invocations.push(ToolInvocation {
                tool_call_id: call.id.clone(),
                tool_name: call.function.name.clone(),
                state: ToolInvocationState::Result,
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or_else(|_| serde_json::Value::String(call.function.arguments.clone())),
                result: Some(result),
            });
        }

        let followup = followup_messages(messages, calls, tool_messages);
        let response = self
            .client
            .chat(ChatRequest::new(self.model.clone(), followup))
            .await?;

        Ok(Completion {
            content: response.content.unwrap_or_default(),
            tool_invocations: invocations,
        })
    }
}

fn followup_messages(
    mut messages: Vec<Message>,
    calls: Vec<ToolCall>,
    tool_messages: Vec<Message>,
) -> Vec<Message> {
    messages.push(Message::ai_with_tools(calls));
    messages.extend(tool_messages);
    messages
}

fn relay_turn(
    mut upstream: FrameStream,
    messages: Vec<Message>,
    client: Arc<dyn ChatClient>,
    executor: Arc<dyn ToolExecutor>,
    model: String,
) -> impl Stream<Item = RelayEvent> + Send {
    stream! {
        let mut phase = RelayPhase::StreamingText;
        let mut accumulator = ToolCallAccumulator::new();

        while let Some(frame) = upstream.next().await {
            let (data, chunk) = match frame {
                Ok(SseFrame::Done) => break,
                Ok(SseFrame::Raw { data }) => {
                    // Unparseable payloads pass through untouched
                    yield RelayEvent::Delta(data);
                    continue;
                }
                Ok(SseFrame::Chunk { data, chunk }) => (data, chunk),
                Err(e) => {
                    tracing::error!(error = %e, "Upstream stream failed");
                    phase.advance(RelayPhase::Error);
                    break;
                }
            };

            let mut saw_tool_call = false;
            for event in chunk.to_stream_events() {
                saw_tool_call |= accumulator.push_event(event);
            }
            if saw_tool_call {
                phase.advance(RelayPhase::AccumulatingToolCalls);
            }

            if !chunk.requests_tools() {
                yield RelayEvent::Delta(data);
                continue;
            }

            // 1. Resolve buffered calls in index order
            let calls = accumulator.take();
            if calls.is_empty() {
                tracing::warn!("Provider requested tools without sending any tool call");
                phase.advance(RelayPhase::StreamingText);
                continue;
            }

            phase.advance(RelayPhase::ExecutingTools);
            let mut tool_messages = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = executor
                    .execute(&call.function.name, &call.function.arguments)
                    .await;
                tool_messages.push(Message::tool_result(call.id.clone(), result.to_string()));
                yield RelayEvent::ToolResult {
                    tool_name: call.function.name.clone(),
                    result,
                };
            }

            // 2. Stream the follow-up completion without tool declarations
            phase.advance(RelayPhase::StreamingFollowup);
            let request = ChatRequest::new(
                model.clone(),
                followup_messages(messages.clone(), calls, tool_messages),
            );
            match client.chat_stream(request).await {
                Ok(mut followup) => {
                    while let Some(frame) = followup.next().await {
                        match frame {
                            Ok(SseFrame::Done) => break,
                            Ok(frame) => {
                                yield RelayEvent::Delta(frame.data().to_string());
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Follow-up stream failed");
                                break;
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Follow-up request rejected"),
            }

            phase.advance(RelayPhase::StreamingText);
        }

        if !phase.is_terminal() {
            phase.advance(RelayPhase::Done);
        }
        tracing::info!(phase = %phase, "Relayed chat turn finished");
        yield RelayEvent::Done;
    }
}
