use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::ServerRow;

/// Fetch the server registered for a conversation.
pub async fn get_by_conversation(
    pool: &SqlitePool,
    conversation_id: i64,
) -> Result<Option<ServerRow>, sqlx::Error> {
    sqlx::query_as::<_, ServerRow>(
        "SELECT id, conversation_id, host, port, name, created_at, updated_at \
         FROM servers WHERE conversation_id = ?",
    )
    .bind(conversation_id)
    .fetch_optional(pool)
    .await
}

/// Insert or update the conversation's server in one statement.
/// `id` and `created_at` survive updates; `updated_at` is refreshed.
pub async fn upsert(
    pool: &SqlitePool,
    conversation_id: i64,
    host: &str,
    port: u16,
    name: &str,
) -> Result<ServerRow, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, ServerRow>(
        "INSERT INTO servers (conversation_id, host, port, name, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT(conversation_id) DO UPDATE SET \
         host = excluded.host, port = excluded.port, name = excluded.name, \
         updated_at = excluded.updated_at \
         RETURNING id, conversation_id, host, port, name, created_at, updated_at",
    )
    .bind(conversation_id)
    .bind(host)
    .bind(i64::from(port))
    .bind(name)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Remove the conversation's server. Returns whether a row was deleted.
pub async fn delete(pool: &SqlitePool, conversation_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM servers WHERE conversation_id = ?")
        .bind(conversation_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
