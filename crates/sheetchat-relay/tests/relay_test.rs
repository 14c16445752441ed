use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use sheetchat_llm::{
    frames_from_chunks, ChatClient, ChatRequest, ChatResponse, FrameStream, FunctionCall, Message,
    ProviderError, ToolCall,
};
use sheetchat_relay::{ChatRelay, RelayEvent, SheetToolExecutor};
use sheetchat_workbook::Workbook;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// SCRIPTED PROVIDER
// ============================================================================

enum Script {
    Stream(Vec<String>),
    Bytes(Vec<Vec<u8>>),
    Broken(Vec<String>),
    Reject(ProviderError),
}

#[derive(Default)]
struct ScriptedClient {
    streams: Mutex<VecDeque<Script>>,
    completions: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn with_streams(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(scripts.into()),
            ..Default::default()
        })
    }

    fn with_completions(responses: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            completions: Mutex::new(responses.into()),
            ..Default::default()
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted completion left"))
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<FrameStream> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted stream left"))?;

        match script {
            Script::Stream(chunks) => Ok(frames_from_chunks(chunks)),
            Script::Bytes(chunks) => Ok(frames_from_chunks(chunks)),
            Script::Broken(chunks) => Ok(Box::pin(frames_from_chunks(chunks).chain(
                futures::stream::once(async { Err(anyhow::anyhow!("connection reset")) }),
            ))),
            Script::Reject(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// SSE HELPERS
// ============================================================================

const DONE: &str = "data: [DONE]\n\n";

fn event(choice: Value) -> String {
    format!("data: {}\n\n", json!({"id": "chatcmpl-1", "choices": [choice]}))
}

fn text(content: &str) -> String {
    event(json!({"index": 0, "delta": {"content": content}, "finish_reason": null}))
}

fn finish(reason: &str) -> String {
    event(json!({"index": 0, "delta": {}, "finish_reason": reason}))
}

fn tool_fragment(index: u32, id: Option<&str>, name: Option<&str>, arguments: Option<&str>) -> String {
    let mut call = json!({"index": index, "function": {}});
    if let Some(id) = id {
        call["id"] = json!(id);
        call["type"] = json!("function");
    }
    if let Some(name) = name {
        call["function"]["name"] = json!(name);
    }
    if let Some(arguments) = arguments {
        call["function"]["arguments"] = json!(arguments);
    }
    event(json!({"index": 0, "delta": {"tool_calls": [call]}, "finish_reason": null}))
}

/// Re-chunk a body at a fixed byte width so lines straddle reads
fn rechunk(parts: &[String], width: usize) -> Vec<String> {
    parts
        .concat()
        .into_bytes()
        .chunks(width)
        .map(|c| String::from_utf8(c.to_vec()).unwrap())
        .collect()
}

fn executor() -> (TempDir, Arc<SheetToolExecutor>) {
    let dir = TempDir::new().unwrap();
    let workbook = Workbook::open(dir.path().join("example.xlsx")).unwrap();
    (dir, Arc::new(SheetToolExecutor::new(workbook)))
}

async fn run(relay: &ChatRelay, prompt: &str) -> Vec<RelayEvent> {
    relay
        .start(vec![Message::human(prompt)])
        .await
        .unwrap()
        .collect()
        .await
}

fn deltas(events: &[RelayEvent]) -> Vec<Value> {
    events
        .iter()
        .filter_map(|e| match e {
            RelayEvent::Delta(data) => serde_json::from_str(data).ok(),
            _ => None,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn test_plain_text_turn_is_relayed() {
    let client = ScriptedClient::with_streams(vec![Script::Stream(vec![
        text("Hello"),
        text(" there"),
        finish("stop"),
        DONE.to_string(),
    ])]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client.clone(), executor, "gpt-4o");

    let events = run(&relay, "hi").await;

    assert_eq!(events.len(), 4);
    assert_eq!(deltas(&events)[0]["choices"][0]["delta"]["content"], "Hello");
    assert_eq!(events.last(), Some(&RelayEvent::Done));

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4o");
    assert_eq!(requests[0].options.tools.as_ref().map(Vec::len), Some(4));
    assert_eq!(requests[0].options.tool_choice, Some(sheetchat_llm::ToolChoice::Auto));
}

#[tokio::test]
async fn test_split_tool_call_is_executed_and_followed_up() {
    let first_turn = vec![
        event(json!({"index": 0, "delta": {"role": "assistant", "content": null}, "finish_reason": null})),
        tool_fragment(0, Some("call_read"), Some("rea"), Some("")),
        tool_fragment(0, None, Some("dExcelRange"), Some("{\"range\":")),
        tool_fragment(0, None, None, Some("\"Sheet1!A1")),
        tool_fragment(0, None, None, Some(":B2\"}")),
        finish("tool_calls"),
        DONE.to_string(),
    ];
    let client = ScriptedClient::with_streams(vec![
        Script::Stream(rechunk(&first_turn, 23)),
        Script::Stream(vec![
            text("A1 holds the Email header"),
            finish("stop"),
            DONE.to_string(),
        ]),
    ]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client.clone(), executor, "gpt-4o");

    let events = run(&relay, "read A1:B2 of Sheet1").await;

    // role chunk + 4 tool fragments, tool result, 2 follow-up chunks, done
    assert_eq!(events.len(), 9);
    let results: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RelayEvent::ToolResult { tool_name, result } => Some((tool_name.clone(), result.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "readExcelRange");
    assert_eq!(results[0].1["success"], true);
    let data = results[0].1["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|row| row.as_array().unwrap().len() == 2));

    // The finish chunk is consumed; follow-up text comes after the tool result
    assert!(matches!(events[5], RelayEvent::ToolResult { .. }));
    assert_eq!(
        deltas(&events[6..7])[0]["choices"][0]["delta"]["content"],
        "A1 holds the Email header"
    );
    assert_eq!(
        events.iter().filter(|e| **e == RelayEvent::Done).count(),
        1
    );
    assert_eq!(events.last(), Some(&RelayEvent::Done));

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    let followup = &requests[1];
    assert!(followup.options.tools.is_none());
    assert_eq!(followup.messages.len(), 3);

    let expected_call = ToolCall {
        id: "call_read".to_string(),
        tool_type: "function".to_string(),
        function: FunctionCall {
            name: "readExcelRange".to_string(),
            arguments: r#"{"range":"Sheet1!A1:B2"}"#.to_string(),
        },
    };
    match &followup.messages[1] {
        Message::AI { tool_calls, content, .. } => {
            assert!(content.is_none());
            assert_eq!(tool_calls.as_deref(), Some(&[expected_call][..]));
        }
        other => panic!("Expected assistant message, got {:?}", other),
    }
    match &followup.messages[2] {
        Message::Tool { tool_call_id, content } => {
            assert_eq!(tool_call_id, "call_read");
            let payload: Value = serde_json::from_str(content).unwrap();
            assert_eq!(payload["success"], true);
        }
        other => panic!("Expected tool message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_every_call_gets_a_result_in_index_order() {
    let client = ScriptedClient::with_streams(vec![
        Script::Stream(vec![
            tool_fragment(1, Some("call_b"), Some("updateExcelCell"), Some(r#"{"sheet":"Sheet1","cell":"B2","value":1}"#)),
            tool_fragment(0, Some("call_a"), Some("getCellFormula"), Some(r#"{"sheet":"Sheet1","cell":"D2"}"#)),
            finish("tool_calls"),
            DONE.to_string(),
        ]),
        Script::Stream(vec![text("done"), DONE.to_string()]),
    ]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client.clone(), executor, "gpt-4o");

    let events = run(&relay, "explain D2 and set B2").await;

    let results: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RelayEvent::ToolResult { tool_name, result } => Some((tool_name.as_str(), result)),
            _ => None,
        })
        .collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "getCellFormula");
    assert_eq!(results[0].1["formula"], "B2*2");
    assert_eq!(results[1].0, "updateExcelCell");
    assert_eq!(
        results[1].1["error"],
        "Action not confirmed. Use confirmAction tool first."
    );

    let followup = &client.requests()[1];
    let ids: Vec<_> = followup.messages[2..]
        .iter()
        .map(|m| match m {
            Message::Tool { tool_call_id, .. } => tool_call_id.clone(),
            other => panic!("Expected tool message, got {:?}", other),
        })
        .collect();
    assert_eq!(ids, vec!["call_a", "call_b"]);
}

#[tokio::test]
async fn test_empty_arguments_count_as_empty_object() {
    let client = ScriptedClient::with_streams(vec![
        Script::Stream(vec![
            tool_fragment(0, Some("call_1"), Some("readExcelRange"), None),
            finish("tool_calls"),
        ]),
        Script::Stream(vec![DONE.to_string()]),
    ]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client, executor, "gpt-4o");

    let events = run(&relay, "read").await;

    match &events[1] {
        RelayEvent::ToolResult { result, .. } => {
            assert!(result["error"].as_str().unwrap().contains("missing field `range`"));
        }
        other => panic!("Expected ToolResult, got {:?}", other),
    }
    assert_eq!(events.last(), Some(&RelayEvent::Done));
}

#[tokio::test]
async fn test_initial_rejection_surfaces_before_streaming() {
    let client = ScriptedClient::with_streams(vec![Script::Reject(ProviderError::new(
        429,
        r#"{"error":{"message":"Rate limit reached"}}"#,
    ))]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client, executor, "gpt-4o");

    let err = match relay.start(vec![Message::human("hi")]).await {
        Ok(_) => panic!("Expected rejection"),
        Err(err) => err,
    };
    assert_eq!(err.downcast_ref::<ProviderError>().map(|e| e.status), Some(429));
}

#[tokio::test]
async fn test_rejected_followup_still_terminates() {
    let client = ScriptedClient::with_streams(vec![
        Script::Stream(vec![
            tool_fragment(0, Some("call_1"), Some("getCellFormula"), Some(r#"{"cell":"E2"}"#)),
            finish("tool_calls"),
            text("trailing text from the first turn"),
            DONE.to_string(),
        ]),
        Script::Reject(ProviderError::new(500, "boom")),
    ]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client, executor, "gpt-4o");

    let events = run(&relay, "explain E2").await;

    assert_eq!(events.len(), 4);
    assert!(matches!(events[1], RelayEvent::ToolResult { .. }));
    assert_eq!(
        deltas(&events[2..3])[0]["choices"][0]["delta"]["content"],
        "trailing text from the first turn"
    );
    assert_eq!(events[3], RelayEvent::Done);
}

#[tokio::test]
async fn test_malformed_payload_passes_through() {
    let client = ScriptedClient::with_streams(vec![Script::Stream(vec![
        "data: {not json}\n\n".to_string(),
        ": keep-alive comment\n\n".to_string(),
        text("ok"),
        DONE.to_string(),
    ])]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client, executor, "gpt-4o");

    let events = run(&relay, "hi").await;

    assert_eq!(events[0], RelayEvent::Delta("{not json}".to_string()));
    assert_eq!(events.len(), 3);
    assert_eq!(events[2], RelayEvent::Done);
}

#[tokio::test]
async fn test_broken_upstream_still_ends_with_done() {
    let client = ScriptedClient::with_streams(vec![Script::Broken(vec![text("partial")])]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client, executor, "gpt-4o");

    let events = run(&relay, "hi").await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[1], RelayEvent::Done);
}

#[tokio::test]
async fn test_complete_runs_tools_and_follows_up() {
    let call = ToolCall {
        id: "call_f".to_string(),
        tool_type: "function".to_string(),
        function: FunctionCall {
            name: "getCellFormula".to_string(),
            arguments: r#"{"sheet":"Sheet1","cell":"D3"}"#.to_string(),
        },
    };
    let client = ScriptedClient::with_completions(vec![
        ChatResponse {
            content: None,
            tool_calls: Some(vec![call]),
        },
        ChatResponse {
            content: Some("D3 doubles the amount in B3".to_string()),
            tool_calls: None,
        },
    ]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client.clone(), executor, "gpt-4o");

    let completion = relay
        .complete(vec![Message::human("explain D3")])
        .await
        .unwrap();

    assert_eq!(completion.content, "D3 doubles the amount in B3");
    assert_eq!(completion.tool_invocations.len(), 1);
    let invocation = &completion.tool_invocations[0];
    assert_eq!(invocation.tool_name, "getCellFormula");
    assert_eq!(invocation.arguments["cell"], "D3");
    assert_eq!(invocation.result.as_ref().unwrap()["formula"], "B3*2");

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].options.tools.is_some());
    assert_eq!(requests[1].messages.len(), 3);
}

#[tokio::test]
async fn test_complete_without_tools() {
    let client = ScriptedClient::with_completions(vec![ChatResponse {
        content: Some("Hi!".to_string()),
        tool_calls: None,
    }]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client.clone(), executor, "gpt-4o");

    let completion = relay.complete(vec![Message::human("hello")]).await.unwrap();

    assert_eq!(completion.content, "Hi!");
    assert!(completion.tool_invocations.is_empty());
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn test_invalid_utf8_line_is_relayed_and_turn_continues() {
    let client = ScriptedClient::with_streams(vec![Script::Bytes(vec![
        b"data: \xff\xfe\n\n".to_vec(),
        text("after").into_bytes(),
        finish("stop").into_bytes(),
        DONE.as_bytes().to_vec(),
    ])]);
    let (_dir, executor) = executor();
    let relay = ChatRelay::new(client, executor, "gpt-4o");

    let events = run(&relay, "hi").await;

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], RelayEvent::Delta("\u{FFFD}\u{FFFD}".to_string()));
    assert_eq!(deltas(&events)[0]["choices"][0]["delta"]["content"], "after");
    assert_eq!(events.last(), Some(&RelayEvent::Done));
}
