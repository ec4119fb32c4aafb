use super::types::chat_completion_object::{ChatCompletionObject, Choice};
use crate::core::LLMError;
use crate::providers::types::{Completion, Message};

impl TryFrom<ChatCompletionObject> for Completion {
    type Error = LLMError;

    /// Takes the first choice; a reply without choices is rejected instead of indexed.
    fn try_from(response: ChatCompletionObject) -> Result<Self, LLMError> {
        let ChatCompletionObject {
            id,
            object,
            created,
            model,
            choices,
            usage,
        } = response;

        let Choice {
            finish_reason,
            message,
        } = choices.into_iter().next().ok_or_else(|| {
            LLMError::InvalidResponse(format!("completion {id} contains no choices"))
        })?;

        Ok(Self {
            id,
            object,
            model,
            created,
            message: Message {
                role: message.role,
                content: message.content.unwrap_or_default(),
                tool_calls: message.tool_calls.unwrap_or_default(),
                tool_call_id: None,
            },
            finish_reason,
            usage: usage.unwrap_or_default(),
        })
    }
}
