use sqlx::SqliteConnection;

use crate::{
    db_types::{Message, NewMessage},
    reservation_objects::ConversationSummary,
};

pub async fn insert_message(message: NewMessage, conn: &mut SqliteConnection) -> Result<Message, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO messages (sender_id, sender_role, receiver_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(message.sender_id)
    .bind(message.sender_role.to_string())
    .bind(message.receiver_id)
    .bind(message.content)
    .fetch_one(conn)
    .await
}

/// One row per chat partner: the latest message between the two users and the caller's unread
/// count, most recent conversation first.
pub async fn fetch_conversations(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ConversationSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            p.partner_id    AS partner_id,
            u.name          AS partner_name,
            m.content       AS last_content,
            m.created_at    AS last_at,
            (SELECT COUNT(*) FROM messages
              WHERE sender_id = p.partner_id AND receiver_id = $1 AND read = 0) AS unread
        FROM (
            SELECT
                CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS partner_id,
                MAX(id) AS last_id
            FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            GROUP BY partner_id
        ) p
        JOIN messages m ON m.id = p.last_id
        JOIN users u ON u.id = p.partner_id
        ORDER BY m.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}

/// Both directions of the conversation between two users, oldest first.
pub async fn fetch_conversation(
    user_id: i64,
    partner_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .bind(partner_id)
    .fetch_all(conn)
    .await
}

/// Receiver-guarded read-flag flip for one message.
pub async fn mark_message_read(
    id: i64,
    receiver_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE messages SET read = 1
            WHERE id = $1 AND receiver_id = $2
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(receiver_id)
    .fetch_optional(conn)
    .await
}

/// Flip the read flag on every unread message from `partner_id` to `receiver_id`.
pub async fn mark_conversation_read(
    receiver_id: i64,
    partner_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE messages SET read = 1 WHERE receiver_id = $1 AND sender_id = $2 AND read = 0")
            .bind(receiver_id)
            .bind(partner_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}
