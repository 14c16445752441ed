use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::dbs::sqlite::{decode_timestamp, encode_timestamp, now};
use crate::error::{PersistError, Result};
use crate::models::Thread;

#[derive(Clone)]
pub struct SqliteThreadRepository {
    pool: SqlitePool,
}

impl SqliteThreadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_thread(&self, title: &str) -> Result<Thread> {
        let now = now();
        let thread = Thread {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO threads (id, title, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&thread.id)
        .bind(&thread.title)
        .bind(encode_timestamp(&thread.created_at))
        .bind(encode_timestamp(&thread.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(thread)
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let row = sqlx::query("SELECT id, title, created_at, updated_at FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_thread).transpose()
    }

    pub async fn list_threads(&self) -> Result<Vec<Thread>> {
        let rows = sqlx::query(
            "SELECT id, title, created_at, updated_at FROM threads
             ORDER BY updated_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_thread).collect()
    }

    pub async fn update_thread(&self, thread_id: &str, title: &str) -> Result<Thread> {
        let result = sqlx::query("UPDATE threads SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(encode_timestamp(&now()))
            .bind(thread_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }

        self.get_thread(thread_id)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(thread_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }
}

fn row_to_thread(row: &SqliteRow) -> Result<Thread> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Thread {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
