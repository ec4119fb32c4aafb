pub mod llm;
pub mod openai;
pub mod simulated_stream;
pub mod types;

pub use llm::{BoxStream, LLMClient};
pub use openai::OpenAIClient;
pub use simulated_stream::{SimulatedStream, CHUNK_SIZE};
pub use types::{Completion, FinishReason, Message, Role, StreamingChunk, Usage};
