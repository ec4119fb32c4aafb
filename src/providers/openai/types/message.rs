use std::borrow::Cow;

use crate::providers::types::{Message as LLMMessage, Role};
use crate::tools::ToolCall;
use crate::tools::ToolDefinition as LLMToolDefinition;
use serde::Serialize;
use serde_json::Value;

/// Outbound message, borrowed from the conversation history
#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: Role,
    /// `null` for assistant turns that only carry tool calls
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<&'a [ToolCall]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<&'a str>,
}

impl<'a> From<&'a LLMMessage> for Message<'a> {
    fn from(msg: &'a LLMMessage) -> Self {
        let only_tool_calls = msg.content.is_empty() && msg.has_tool_calls();
        Self {
            role: msg.role,
            content: (!only_tool_calls).then_some(msg.content.as_str()),
            tool_calls: msg.has_tool_calls().then_some(msg.tool_calls.as_slice()),
            tool_call_id: msg.tool_call_id.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Tool<'a> {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: Function<'a>,
}

#[derive(Debug, Serialize)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

impl<'a> From<&'a LLMToolDefinition> for Tool<'a> {
    fn from(tool_definition: &'a LLMToolDefinition) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: Function {
                name: tool_definition.name.as_str(),
                description: Some(tool_definition.description.as_str()),
                parameters: Cow::Borrowed(&tool_definition.parameters),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Function<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub parameters: Cow<'a, Value>,
}
