mod message;
mod thread;

pub use message::{Message, MessageRole, NewMessage, ToolInvocation, ToolInvocationState};
pub use thread::Thread;
