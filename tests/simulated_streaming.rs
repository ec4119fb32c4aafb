use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use llm_shim::core::conversation::ConversationManager;
use llm_shim::core::dispatcher::{Dispatcher, Session, SessionStatus, TIMEOUT_REPLY};
use llm_shim::providers::openai::types::{ChatCompletionObject, ChatCompletionRequest};
use llm_shim::providers::openai::ChatEndpoint;
use llm_shim::providers::{FinishReason, LLMClient, Message, OpenAIClient, StreamingChunk};
use llm_shim::tools::{InfoApiTool, ToolRegistry};
use llm_shim::{Config, LLMError};
use serde_json::{json, Value};

/// Serves queued replies in order, optionally after a delay
struct QueueEndpoint {
    replies: Mutex<VecDeque<Value>>,
    delay: Option<Duration>,
}

impl QueueEndpoint {
    fn new(replies: impl IntoIterator<Item = Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            delay: None,
        }
    }

    fn slow(delay: Duration, reply: Value) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new([reply])
        }
    }
}

#[async_trait]
impl ChatEndpoint for QueueEndpoint {
    async fn create_chat_completion(
        &self,
        _request: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionObject, LLMError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::ServerError("no reply queued".to_string()))?;
        serde_json::from_value(reply).map_err(|e| LLMError::ResponseFormat(e.to_string()))
    }
}

fn reply(content: Value, tool_calls: Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-it",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "openai/gpt-4.1-nano",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content, "tool_calls": tool_calls },
            "finish_reason": finish_reason
        }],
        "usage": { "prompt_tokens": 20, "completion_tokens": 9, "total_tokens": 29 }
    })
}

fn lookup_call() -> Value {
    json!([{
        "id": "call_1",
        "type": "function",
        "function": { "name": "info_api", "arguments": "{\"name\":\"extratos\"}" }
    }])
}

fn lookup_manager(endpoint: QueueEndpoint, max_steps: u32) -> ConversationManager {
    let mut registry = ToolRegistry::new();
    registry.register(InfoApiTool);
    ConversationManager::new(
        Box::new(OpenAIClient::with_endpoint(endpoint, Config::default())),
        Some(registry),
        None,
        max_steps,
    )
}

async fn stream_chunks(reply: Value) -> Vec<StreamingChunk> {
    let client = OpenAIClient::with_endpoint(QueueEndpoint::new([reply]), Config::default());
    client
        .query_streaming(&[Message::user("hi")], None)
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await
}

#[tokio::test]
async fn test_text_reply_scenario() {
    let content = "Hello world, this is a test.";
    let chunks = stream_chunks(reply(json!(content), Value::Null, "stop")).await;

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<String>(), content);
    assert!(chunks[..2]
        .iter()
        .all(|c| c.usage.is_zero() && c.finish_reason.is_none() && !c.is_finished));
    assert!(chunks[2].is_finished);
    assert_eq!(chunks[2].finish_reason, Some(FinishReason::Stop));
    assert_eq!(chunks[2].usage.total_tokens, 29);
}

#[tokio::test]
async fn test_single_tool_call_scenario() {
    let chunks = stream_chunks(reply(
        Value::Null,
        json!([{
            "id": "call_x",
            "type": "function",
            "function": { "name": "lookup", "arguments": "{}" }
        }]),
        "tool_calls",
    ))
    .await;

    assert_eq!(chunks.len(), 2);
    let call = chunks[0].tool_use.as_ref().unwrap();
    assert_eq!(call.function.name, "lookup");
    assert_eq!(call.function.arguments, "{}");
    assert!(chunks[1].is_finished && chunks[1].text.is_empty());
}

#[tokio::test]
async fn test_empty_reply_has_no_terminal_chunk() {
    let chunks = stream_chunks(reply(Value::Null, Value::Null, "stop")).await;
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn test_dispatcher_runs_tool_round_trip() {
    let endpoint = QueueEndpoint::new([
        reply(Value::Null, lookup_call(), "tool_calls"),
        reply(json!("extratos serves bank statements."), Value::Null, "stop"),
    ]);
    let dispatcher = Dispatcher::new(lookup_manager(endpoint, 5));
    let mut session = Session::new();

    let answer = dispatcher.dispatch("what is extratos?", &mut session).await;

    assert_eq!(answer, "extratos serves bank statements.");
    assert!(matches!(session.status, SessionStatus::Succeeded { .. }));
    assert_eq!(session.history.len(), 2);
}

#[tokio::test]
async fn test_dispatcher_fails_when_steps_run_out_on_tool_call() {
    let endpoint = QueueEndpoint::new([reply(Value::Null, lookup_call(), "tool_calls")]);
    let dispatcher = Dispatcher::new(lookup_manager(endpoint, 1));
    let mut session = Session::new();

    let answer = dispatcher.dispatch("what is extratos?", &mut session).await;

    assert_eq!(
        answer,
        "Internal error: Max steps (1) reached without a final answer"
    );
    assert!(matches!(session.status, SessionStatus::Failed { .. }));
    assert!(session.history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_times_out_slow_endpoint() {
    let endpoint = QueueEndpoint::slow(
        Duration::from_secs(60),
        reply(json!("too late"), Value::Null, "stop"),
    );
    let manager = ConversationManager::new(
        Box::new(OpenAIClient::with_endpoint(endpoint, Config::default())),
        None,
        None,
        5,
    );
    let dispatcher = Dispatcher::new(manager);
    let mut session = Session::new();

    let answer = dispatcher.dispatch("hello?", &mut session).await;

    assert_eq!(answer, TIMEOUT_REPLY);
    assert!(matches!(session.status, SessionStatus::TimedOut { .. }));
}

#[tokio::test]
async fn test_dispatcher_reports_endpoint_failure() {
    let endpoint = QueueEndpoint::new(Vec::<Value>::new());
    let manager = ConversationManager::new(
        Box::new(OpenAIClient::with_endpoint(endpoint, Config::default())),
        None,
        None,
        5,
    );
    let dispatcher = Dispatcher::new(manager);
    let mut session = Session::new();

    let answer = dispatcher.dispatch("hello?", &mut session).await;

    assert_eq!(answer, "Internal error: Server error: no reply queued");
    assert!(matches!(session.status, SessionStatus::Failed { .. }));
}
