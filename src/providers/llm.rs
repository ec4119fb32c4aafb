use crate::core::LLMError;
use crate::providers::{Completion, Message, StreamingChunk};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type BoxStream = Pin<Box<dyn Stream<Item = Result<StreamingChunk, LLMError>> + Send + 'static>>;

#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Query the LLM with a list of messages and optional tools
    async fn query(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Completion, LLMError>;

    /// Query the LLM and receive the reply as a chunk stream
    async fn query_streaming(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<BoxStream, LLMError>;
}
