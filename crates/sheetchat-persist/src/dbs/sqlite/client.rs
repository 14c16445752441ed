use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::dbs::sqlite::repositories::{SqliteMessageRepository, SqliteThreadRepository};
use crate::dbs::sqlite::schema;
use crate::error::Result;
use crate::models::{Message, NewMessage, Thread};
use crate::trait_client::PersistenceClient;

pub struct SqlitePersistenceClient {
    pool: SqlitePool,
    thread_repo: SqliteThreadRepository,
    message_repo: SqliteMessageRepository,
}

impl SqlitePersistenceClient {
    /// Open (or create) the database at `database_url` and apply the schema
    pub async fn connect(database_url: &str) -> Result<Self> {
        if let Some(parent) = database_file(database_url)
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        tracing::info!(database_url, "Connected to SQLite");
        Self::from_pool(pool).await
    }

    /// Private in-memory database on a single pinned connection
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(opts)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        schema::migrate(&pool).await?;

        Ok(Self {
            thread_repo: SqliteThreadRepository::new(pool.clone()),
            message_repo: SqliteMessageRepository::new(pool.clone()),
            pool,
        })
    }
}

/// Filesystem path behind a `sqlite:` URL, `None` for in-memory databases
fn database_file(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

#[async_trait]
impl PersistenceClient for SqlitePersistenceClient {
    async fn create_thread(&self, title: &str) -> Result<Thread> {
        self.thread_repo.create_thread(title).await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        self.thread_repo.get_thread(thread_id).await
    }

    async fn list_threads(&self) -> Result<Vec<Thread>> {
        self.thread_repo.list_threads().await
    }

    async fn update_thread(&self, thread_id: &str, title: &str) -> Result<Thread> {
        self.thread_repo.update_thread(thread_id, title).await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.thread_repo.delete_thread(thread_id).await
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        self.message_repo.create_message(message).await
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        self.message_repo.get_messages(thread_id).await
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.message_repo.delete_message(message_id).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
