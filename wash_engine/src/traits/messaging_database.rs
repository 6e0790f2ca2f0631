use thiserror::Error;

use crate::{
    db_types::{Message, NewMessage, NewNotification, Notification},
    reservation_objects::{ConversationSummary, NotificationFeed},
};

/// Notifications and direct messages.
///
/// These records are the durable half of the real-time layer: the row is written first, and only
/// then is the live event multicast. A disconnected client misses the push but finds the row on
/// its next fetch.
#[allow(async_fn_in_trait)]
pub trait MessagingDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MessagingError>;

    /// Notifications for a user, newest first, with the unread count.
    async fn fetch_notifications(&self, user_id: i64) -> Result<NotificationFeed, MessagingError>;

    /// Flip the read flag on one notification. Owner-guarded in the UPDATE statement.
    async fn mark_notification_read(&self, notification_id: i64, user_id: i64) -> Result<Notification, MessagingError>;

    /// Flip the read flag on all of a user's unread notifications. Returns the number flipped.
    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, MessagingError>;

    /// Delete one notification. Owner-guarded; the only delete in the engine.
    async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), MessagingError>;

    /// Persist a direct message. Content is immutable after this.
    async fn insert_message(&self, message: NewMessage) -> Result<Message, MessagingError>;

    /// One summary row per chat partner of `user_id`, most recent conversation first.
    async fn fetch_conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>, MessagingError>;

    /// Both directions of the conversation between two users, oldest first.
    async fn fetch_conversation(&self, user_id: i64, partner_id: i64) -> Result<Vec<Message>, MessagingError>;

    /// Flip the read flag on one message. Receiver-guarded in the UPDATE statement.
    async fn mark_message_read(&self, message_id: i64, receiver_id: i64) -> Result<Message, MessagingError>;

    /// Flip the read flag on every unread message from `partner_id` to `receiver_id`. Returns the
    /// number flipped.
    async fn mark_conversation_read(&self, receiver_id: i64, partner_id: i64) -> Result<u64, MessagingError>;
}

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested notification {0} does not exist for this user")]
    NotificationNotFound(i64),
    #[error("The requested message {0} does not exist for this user")]
    MessageNotFound(i64),
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
    #[error("Message content must not be empty")]
    EmptyContent,
}

impl From<sqlx::Error> for MessagingError {
    fn from(e: sqlx::Error) -> Self {
        MessagingError::DatabaseError(e.to_string())
    }
}
