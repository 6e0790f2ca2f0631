use sqlx::SqliteConnection;

use crate::{
    db_types::{NewNotification, Notification},
    reservation_objects::NotificationFeed,
};

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO notifications (user_id, title, body, kind, action_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.title)
    .bind(notification.body)
    .bind(notification.kind)
    .bind(notification.action_url)
    .fetch_one(conn)
    .await
}

pub async fn fetch_notifications(user_id: i64, conn: &mut SqliteConnection) -> Result<NotificationFeed, sqlx::Error> {
    let notifications: Vec<Notification> =
        sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
    let (unread,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = 0")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
    Ok(NotificationFeed { unread, notifications })
}

/// Owner-guarded read-flag flip.
pub async fn mark_notification_read(
    id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE notifications SET read = 1
            WHERE id = $1 AND user_id = $2
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn mark_all_notifications_read(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = $1 AND read = 0")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Owner-guarded delete; the only place the engine removes a row.
pub async fn delete_notification(id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
