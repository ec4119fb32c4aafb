use serde::{Deserialize, Serialize};
use serde_with::DefaultOnNull;

use crate::tools::ToolCall;

/// Why the endpoint stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    FunctionCall,
    #[serde(other)]
    Unknown,
}

/// Token accounting for one completion. Missing or null fields count as zero.
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub prompt_tokens: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub completion_tokens: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub total_tokens: u32,
}

impl Usage {
    pub const fn is_zero(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0 && self.total_tokens == 0
    }
}

/// One unit of a simulated streaming response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingChunk {
    /// Choice position; always 0, there is no multi-choice fan-out
    pub index: u32,
    pub text: String,
    pub tool_use: Option<ToolCall>,
    pub is_finished: bool,
    pub finish_reason: Option<FinishReason>,
    /// Zero everywhere except on the terminal chunk
    pub usage: Usage,
}

impl StreamingChunk {
    /// Announces a tool call ahead of any text
    pub fn tool_use(call: ToolCall) -> Self {
        Self {
            index: 0,
            text: String::new(),
            tool_use: Some(call),
            is_finished: false,
            finish_reason: None,
            usage: Usage::default(),
        }
    }

    /// A text segment that is not the last one
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            index: 0,
            text: text.into(),
            tool_use: None,
            is_finished: false,
            finish_reason: None,
            usage: Usage::default(),
        }
    }

    /// The chunk carrying the real finish reason and usage
    pub fn last(
        text: impl Into<String>,
        is_finished: bool,
        finish_reason: Option<FinishReason>,
        usage: Usage,
    ) -> Self {
        Self {
            index: 0,
            text: text.into(),
            tool_use: None,
            is_finished,
            finish_reason,
            usage,
        }
    }
}
