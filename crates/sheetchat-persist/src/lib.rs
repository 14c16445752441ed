pub mod dbs;
pub mod error;
pub mod models;
pub mod trait_client;

pub use dbs::sqlite::SqlitePersistenceClient;
pub use error::{PersistError, Result};
pub use models::{Message, MessageRole, NewMessage, Thread, ToolInvocation, ToolInvocationState};
pub use trait_client::PersistenceClient;
