mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;

pub use config::Config;
pub use config::Provider;
pub use config::ProviderConfig;
pub use error::LLMError;
