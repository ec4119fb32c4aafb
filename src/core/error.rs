#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    /// Response parsing errors (missing fields, invalid format)
    #[error("Failed to parse response: {0}")]
    ResponseFormat(String),
    /// The endpoint replied with a well-formed body that cannot be used, e.g. no choices
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// API-specific errors (rate limits, invalid auth, etc)
    #[error("API error: {0}")]
    ApiError(String),
    /// Tool execution errors
    #[error("Tool error: {0}")]
    ToolError(ToolError),
    /// Authentication-specific errors
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),
    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IOError(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The wall-clock budget for a request ran out
    #[error("Timed out after {0:.2?}")]
    Timeout(std::time::Duration),
    /// The model kept asking for tools until the step budget ran out
    #[error("Max steps ({0}) reached without a final answer")]
    MaxStepsReached(u32),
    /// A blocking call was made on a thread that is already driving an async runtime
    #[error("Blocking call made from inside an async runtime; use the async variant")]
    BlockingInRuntime,
    /// The caller lost interest and the work stopped at a checkpoint
    #[error("Cancelled")]
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool not found error
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    /// Tool not enabled error
    #[error("Tool calls not enabled but llm tried to call a tool: {0}")]
    ToolCallsDisabled(String),
    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<ToolError> for LLMError {
    fn from(err: ToolError) -> Self {
        Self::ToolError(err)
    }
}

impl From<std::io::Error> for LLMError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err.to_string())
    }
}

impl From<::config::ConfigError> for LLMError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        // If the error has a status code, map it to a more specific error
        if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => Self::Authentication(format!("Authentication failed: {err}")),
                404 => Self::NotFound(format!("Resource not found: {err}")),
                429 => Self::ApiError(format!("Rate limit exceeded: {err}")),
                500..=599 => Self::ServerError(format!("Server error: {err}")),
                _ => Self::Network(err),
            }
        } else {
            Self::Network(err)
        }
    }
}
