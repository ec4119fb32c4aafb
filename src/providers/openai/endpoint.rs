use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use uuid::Uuid;

use super::types::{ChatCompletionObject, ChatCompletionRequest, OpenAIErrorResponse};
use crate::core::LLMError;

/// Header attached to every outbound request for cross-system tracing
pub const CORRELATION_HEADER: &str = "correlation-id";

static CORRELATION_ID: Lazy<String> = Lazy::new(|| Uuid::now_v7().to_string());

/// Time-sortable identifier generated once per process
pub fn correlation_id() -> &'static str {
    &CORRELATION_ID
}

/// A chat completions endpoint answering one request with one full reply
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionObject, LLMError>;
}

/// OpenAI-compatible endpoint reached over HTTP(S)
pub struct HttpEndpoint {
    client: Client,
    url: String,
    api_key: Option<String>,
    correlation_id: HeaderValue,
}

impl HttpEndpoint {
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://openrouter.ai/api/v1`
    /// * `api_key` - Bearer token; `None` for gateways that do their own auth
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, LLMError> {
        let correlation_id = HeaderValue::from_str(correlation_id())
            .map_err(|e| LLMError::ConfigError(format!("Invalid correlation id: {e}")))?;

        // Blocking calls run on a throwaway runtime, so pooled connections
        // must not outlive the call that opened them.
        let client = Client::builder().pool_max_idle_per_host(0).build()?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            correlation_id,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, body: &ChatCompletionRequest<'_>) -> RequestBuilder {
        let builder = self
            .client
            .post(&self.url)
            .header(CORRELATION_HEADER, self.correlation_id.clone())
            .json(body);
        match &self.api_key {
            Some(key) => builder.header(AUTHORIZATION, format!("Bearer {key}")),
            None => builder,
        }
    }
}

#[async_trait]
impl ChatEndpoint for HttpEndpoint {
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionObject, LLMError> {
        debug!("[HTTP] POST {} model={}", self.url, request.model);
        let response = self.request(request).send().await.map_err(LLMError::from)?;

        match response.status() {
            StatusCode::OK => {
                let response_text = response.text().await.map_err(|e| {
                    LLMError::ResponseFormat(format!("Failed to get response text: {e}"))
                })?;
                serde_json::from_str(&response_text).map_err(|e| {
                    LLMError::ResponseFormat(format!("Failed to parse completion: {e}"))
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(LLMError::Authentication(
                "Invalid API key or unauthorized access".to_string(),
            )),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                let detail = serde_json::from_str::<OpenAIErrorResponse>(&error_text)
                    .map_or(error_text, |body| body.error.message);
                let message = format!("API request failed with status {status}: {detail}");
                Err(match status.as_u16() {
                    404 => LLMError::NotFound(message),
                    500..=599 => LLMError::ServerError(message),
                    _ => LLMError::ApiError(message),
                })
            }
        }
    }
}
