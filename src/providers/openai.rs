pub mod client;
pub mod endpoint;
mod normalize;
pub mod types;

pub use client::OpenAIClient;
pub use endpoint::{correlation_id, ChatEndpoint, HttpEndpoint, CORRELATION_HEADER};
