mod message;
mod thread;

pub use message::SqliteMessageRepository;
pub use thread::SqliteThreadRepository;
