use serde::Deserialize;

use crate::providers::types::{FinishReason, Role, Usage};
use crate::tools::ToolCall;

/// Non-streaming reply of the chat completions endpoint
#[derive(Debug, Deserialize)]
pub struct ChatCompletionObject {
    pub id: String,
    #[serde(default = "default_object")]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub finish_reason: Option<FinishReason>,
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

fn default_object() -> String {
    "chat.completion".to_string()
}
