use super::{FinishReason, Message, Usage};

/// One normalized, non-streamed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: String,
    /// Object type reported by the endpoint, `chat.completion` when omitted
    pub object: String,
    pub model: String,
    pub created: u64,
    pub message: Message,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
}
