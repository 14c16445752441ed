use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::dbs::sqlite::{decode_timestamp, encode_timestamp, now};
use crate::error::{PersistError, Result};
use crate::models::{Message, NewMessage, ToolInvocation};

#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the message and touch the thread in one transaction
    pub async fn create_message(&self, new: NewMessage) -> Result<Message> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            thread_id: new.thread_id,
            role: new.role,
            content: new.content,
            tool_invocations: new.tool_invocations,
            created_at: now(),
        };
        let tool_invocations = message
            .tool_invocations
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let created_at = encode_timestamp(&message.created_at);

        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE threads SET updated_at = ? WHERE id = ?")
            .bind(&created_at)
            .bind(&message.thread_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(PersistError::ThreadNotFound(message.thread_id));
        }

        sqlx::query(
            "INSERT INTO messages (id, thread_id, role, content, tool_invocations, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.thread_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(tool_invocations)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            message_id = %message.id,
            thread_id = %message.thread_id,
            role = %message.role,
            "Message saved"
        );
        Ok(message)
    }

    pub async fn get_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, thread_id, role, content, tool_invocations, created_at FROM messages
             WHERE thread_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }

    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistError::MessageNotFound(message_id.to_string()));
        }
        Ok(())
    }
}

fn row_to_message(row: &SqliteRow) -> Result<Message> {
    let role: String = row.try_get("role")?;
    let tool_invocations: Option<String> = row.try_get("tool_invocations")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Message {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        role: role.parse()?,
        content: row.try_get("content")?,
        tool_invocations: tool_invocations
            .as_deref()
            .map(serde_json::from_str::<Vec<ToolInvocation>>)
            .transpose()?,
        created_at: decode_timestamp(&created_at)?,
    })
}
