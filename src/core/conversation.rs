use std::io::Write;

use crate::core::{error::ToolError, LLMError};
use crate::providers::{BoxStream, FinishReason, LLMClient, Message, Role};
use crate::tools::{ToolCall, ToolRegistry};
use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::dispatcher::Agent;

/// Manages the conversation loop between an LLM and its available tools.
/// Handles chunk consumption, tool execution, and conversation state.
pub struct ConversationManager {
    client: Box<dyn LLMClient>,
    tool_registry: Option<ToolRegistry>,
    system_prompt: Option<String>,
    max_steps: u32,
}

impl ConversationManager {
    /// Creates a new `ConversationManager`.
    ///
    /// # Arguments
    /// * `client` - The LLM client implementation to use for queries
    /// * `tool_registry` - Optional registry containing available tools
    /// * `system_prompt` - Prepended to every conversation when set
    /// * `max_steps` - Maximum number of model calls per run
    pub fn new(
        client: Box<dyn LLMClient>,
        tool_registry: Option<ToolRegistry>,
        system_prompt: Option<String>,
        max_steps: u32,
    ) -> Self {
        Self {
            client,
            tool_registry,
            system_prompt,
            max_steps,
        }
    }

    /// Builds the message list for one user turn on top of earlier history
    pub fn initial_messages(&self, history: &[Message], message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            if history.first().map(|m| m.role) != Some(Role::System) {
                messages.push(Message::system(prompt.as_str()));
            }
        }
        messages.extend_from_slice(history);
        messages.push(Message::user(message));
        messages
    }

    /// Runs the conversation loop, executing tools until the model answers without them.
    ///
    /// The token is checked before every model call and every tool execution;
    /// a model call already in flight is dropped when the token fires.
    ///
    /// # Returns
    /// * `Result<Vec<Message>, LLMError>` - The final conversation messages or an error.
    ///   Running out of steps while the model still asks for tools is an error.
    pub async fn run<W: Write + Send>(
        &self,
        initial_messages: Vec<Message>,
        writer: &mut W,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, LLMError> {
        let mut conversation_state = ConversationState::new(initial_messages);
        let tool_definitions = self
            .tool_registry
            .as_ref()
            .map(ToolRegistry::get_tool_definitions);

        for i in 0..self.max_steps {
            debug!("[Conversation] step: {i}");
            let request = self
                .client
                .query_streaming(&conversation_state.messages, tool_definitions.as_deref());
            let stream = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LLMError::Cancelled),
                stream = request => stream?,
            };

            let (content, tool_calls) = Self::collect_response(stream, writer).await?;

            if tool_calls.is_empty() {
                conversation_state.add_assistant_message(content, tool_calls);
                debug!("[Conversation] No tool calls, ending conversation");
                return Ok(conversation_state.messages);
            }

            let tool_results = self.handle_tool_calls(&tool_calls, cancel).await?;
            debug!("[Conversation] Tool results: {tool_results:?}");
            conversation_state.add_assistant_message(content, tool_calls);
            conversation_state.add_tool_results(tool_results);
        }

        warn!("[Conversation] Gave up after {} steps", self.max_steps);
        Err(LLMError::MaxStepsReached(self.max_steps))
    }

    /// Drains one chunk stream, writing text as it arrives and collecting tool calls.
    async fn collect_response<W: Write + Send>(
        mut stream: BoxStream,
        writer: &mut W,
    ) -> Result<(String, Vec<ToolCall>), LLMError> {
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(call) = chunk.tool_use {
                tool_calls.push(call);
            }
            if !chunk.text.is_empty() {
                writer.write_all(chunk.text.as_bytes())?;
                writer.flush()?;
                content.push_str(&chunk.text);
            }
            match chunk.finish_reason {
                Some(FinishReason::Length) => warn!("[Conversation] Response exceeded max tokens"),
                Some(FinishReason::ContentFilter) => {
                    warn!("[Conversation] Content filter triggered");
                }
                _ => {}
            }
        }

        Ok((content, tool_calls))
    }

    /// Executes a sequence of tool calls and returns their results.
    ///
    /// Failures of individual tools are reported back to the model as the
    /// tool's result rather than ending the conversation.
    async fn handle_tool_calls(
        &self,
        tool_calls: &[ToolCall],
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, LLMError> {
        let tool_registry = self.tool_registry.as_ref().ok_or_else(|| {
            let disabled_tools = tool_calls
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            ToolError::ToolCallsDisabled(disabled_tools)
        })?;

        let mut messages = Vec::with_capacity(tool_calls.len());

        for tool_call in tool_calls {
            if cancel.is_cancelled() {
                return Err(LLMError::Cancelled);
            }

            let content = match tool_registry
                .execute_tool(&tool_call.function.name, &tool_call.parsed_arguments())
                .await
            {
                Ok(serde_json::Value::String(text)) => text,
                Ok(value) => value.to_string(),
                Err(e) => {
                    warn!("[Conversation] Tool {tool_call} failed: {e}");
                    format!("error: {e}")
                }
            };

            messages.push(Message::tool(content, &tool_call.id));
        }

        Ok(messages)
    }
}

#[async_trait]
impl Agent for ConversationManager {
    async fn run(
        &self,
        message: String,
        history: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<String, LLMError> {
        let messages = self.initial_messages(&history, &message);
        let transcript =
            ConversationManager::run(self, messages, &mut std::io::sink(), &cancel).await?;

        Ok(transcript
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }
}

/// Maintains the state of an ongoing conversation.
struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    const fn new(initial_messages: Vec<Message>) -> Self {
        Self {
            messages: initial_messages,
        }
    }

    fn add_assistant_message(&mut self, content: String, tool_calls: Vec<ToolCall>) {
        self.messages.push(Message::assistant(content, tool_calls));
    }

    fn add_tool_results(&mut self, results: Vec<Message>) {
        self.messages.extend(results);
    }
}
