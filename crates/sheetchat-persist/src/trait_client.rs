use async_trait::async_trait;
use crate::models::{Message, NewMessage, Thread};
use crate::error::Result;

/// Trait for thread and message storage
///
/// Implementations own their connection pool; callers construct one at
/// startup and share it behind an `Arc`.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a new thread
    async fn create_thread(&self, title: &str) -> Result<Thread>;

    /// Get a thread by ID
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// All threads, most recently updated first
    async fn list_threads(&self) -> Result<Vec<Thread>>;

    /// Rename a thread and bump its `updated_at`
    async fn update_thread(&self, thread_id: &str, title: &str) -> Result<Thread>;

    /// Delete a thread together with its messages
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Insert a message and bump its thread's `updated_at`
    async fn create_message(&self, message: NewMessage) -> Result<Message>;

    /// Messages of a thread in creation order
    async fn get_messages(&self, thread_id: &str) -> Result<Vec<Message>>;

    async fn delete_message(&self, message_id: &str) -> Result<()>;

    /// Cheap round trip to the database
    async fn ping(&self) -> Result<()>;

    /// Close the underlying pool
    async fn close(&self);
}
