use crate::core::{Config, LLMError};
use crate::providers::llm::{BoxStream, LLMClient};
use crate::providers::simulated_stream::SimulatedStream;
use crate::providers::types::{Completion, Message as LLMMessage};
use crate::tools::ToolDefinition as LLMToolDefinition;
use futures::StreamExt;
use log::debug;

use super::endpoint::{ChatEndpoint, HttpEndpoint};
use super::types::{ChatCompletionRequest, Message, Tool};

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// Every operation performs exactly one non-streamed request. The chunked
/// variants replay the full reply through [`SimulatedStream`], so the
/// blocking and async flavours yield the same chunks for the same reply.
pub struct OpenAIClient<E = HttpEndpoint> {
    endpoint: E,
    config: Config,
}

impl OpenAIClient<HttpEndpoint> {
    /// Creates a client for the configured provider, resolving its API key from the environment
    pub fn new(config: Config) -> Result<Self, LLMError> {
        let api_key = config.api_key()?;
        let endpoint = HttpEndpoint::new(&config.provider_config().base_url, api_key)?;
        Ok(Self::with_endpoint(endpoint, config))
    }
}

impl<E: ChatEndpoint> OpenAIClient<E> {
    pub const fn with_endpoint(endpoint: E, config: Config) -> Self {
        Self { endpoint, config }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [LLMMessage],
        tools: Option<&'a [LLMToolDefinition]>,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: self.config.get_model(),
            messages: messages.iter().map(Message::from).collect(),
            tools: tools.map(|tools| tools.iter().map(Tool::from).collect()),
            stream: false,
            max_completion_tokens: Some(self.config.get_max_tokens()),
            temperature: self.config.temperature,
        }
    }

    async fn complete(
        &self,
        messages: &[LLMMessage],
        tools: Option<&[LLMToolDefinition]>,
    ) -> Result<Completion, LLMError> {
        let request = self.build_request(messages, tools);
        let response = self.endpoint.create_chat_completion(&request).await?;
        let completion = Completion::try_from(response)?;
        debug!(
            "[OpenAI] completion {} finish_reason={:?} usage={:?}",
            completion.id, completion.finish_reason, completion.usage
        );
        Ok(completion)
    }

    /// Blocking single-shot query.
    ///
    /// Drives the request on a private current-thread runtime. Calling this
    /// from inside an async runtime returns [`LLMError::BlockingInRuntime`].
    pub fn query_blocking(
        &self,
        messages: &[LLMMessage],
        tools: Option<&[LLMToolDefinition]>,
    ) -> Result<Completion, LLMError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(LLMError::BlockingInRuntime);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.complete(messages, tools))
    }

    /// Blocking chunked query; the request completes before the first chunk is available
    pub fn query_streaming_blocking(
        &self,
        messages: &[LLMMessage],
        tools: Option<&[LLMToolDefinition]>,
    ) -> Result<SimulatedStream, LLMError> {
        self.query_blocking(messages, tools).map(SimulatedStream::new)
    }
}

#[async_trait::async_trait]
impl<E: ChatEndpoint> LLMClient for OpenAIClient<E> {
    async fn query(
        &self,
        messages: &[LLMMessage],
        tools: Option<&[LLMToolDefinition]>,
    ) -> Result<Completion, LLMError> {
        self.complete(messages, tools).await
    }

    async fn query_streaming(
        &self,
        messages: &[LLMMessage],
        tools: Option<&[LLMToolDefinition]>,
    ) -> Result<BoxStream, LLMError> {
        let completion = self.complete(messages, tools).await?;
        Ok(futures::stream::iter(SimulatedStream::new(completion))
            .map(Ok)
            .boxed())
    }
}
