pub mod chat_completion_object;
pub mod chat_completion_request;
pub mod message;
pub mod shared;

pub use chat_completion_object::ChatCompletionObject;
pub use chat_completion_request::ChatCompletionRequest;
pub use message::{Message, Tool};
pub use shared::OpenAIErrorResponse;
