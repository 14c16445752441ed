pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;
pub mod error;

pub use traits::{
    ChatClient,
    ChatRequest, ChatResponse, ChatOptions,
    FrameStream,
};

pub use streaming::{ChatStreamChunk, SseFrame, StreamEvent};
pub use buffer_utils::{CircularLineBuffer, frames_from_chunks, parse_sse_frames};
pub use openai::OpenAIClient;
pub use error::ProviderError;
pub use types::{Message, Tool, ToolCall, ToolChoice, FunctionCall};
