pub mod completion;
pub mod messages;
pub mod streaming_chunk;

pub use completion::Completion;
pub use messages::{Message, Role};
pub use streaming_chunk::{FinishReason, StreamingChunk, Usage};
