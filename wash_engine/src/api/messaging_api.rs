use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Message, NewMessage, NewNotification, Notification, Role},
    events::{EventProducers, MessageEvent, NotificationEvent},
    reservation_objects::{ConversationSummary, NotificationFeed},
    traits::{MessagingDatabase, MessagingError},
};

/// `MessagingApi` persists notifications and direct messages, then republishes them to the
/// real-time layer. The database write always happens first; that write is the only durability
/// the system promises for these records.
pub struct MessagingApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for MessagingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessagingApi")
    }
}

impl<B> MessagingApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> MessagingApi<B>
where B: MessagingDatabase
{
    /// Persist and push a notification. Used by operational flows that want to tell a user
    /// something outside the reservation side effects (which persist their notifications inside
    /// the ledger transaction instead).
    pub async fn notify(&self, notification: NewNotification) -> Result<Notification, MessagingError> {
        let notification = self.db.insert_notification(notification).await?;
        for producer in &self.producers.notification_producers {
            producer.publish_event(NotificationEvent::new(notification.clone())).await;
        }
        Ok(notification)
    }

    /// Persist a direct message and push it to the recipient (and echo to the sender).
    pub async fn send_message(
        &self,
        sender_id: i64,
        sender_role: Role,
        receiver_id: i64,
        content: String,
    ) -> Result<Message, MessagingError> {
        let message = self.db.insert_message(NewMessage { sender_id, sender_role, receiver_id, content }).await?;
        trace!("💬️ Message #{} persisted, publishing", message.id);
        for producer in &self.producers.message_producers {
            producer.publish_event(MessageEvent::new(message.clone())).await;
        }
        Ok(message)
    }

    pub async fn conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>, MessagingError> {
        self.db.fetch_conversations(user_id).await
    }

    /// The conversation with a partner, marking their unread messages to the caller as read in
    /// the same call (the per-batch flip).
    pub async fn conversation(&self, user_id: i64, partner_id: i64) -> Result<Vec<Message>, MessagingError> {
        let messages = self.db.fetch_conversation(user_id, partner_id).await?;
        let flipped = self.db.mark_conversation_read(user_id, partner_id).await?;
        if flipped > 0 {
            trace!("💬️ Marked {flipped} messages from #{partner_id} to #{user_id} as read");
        }
        Ok(messages)
    }

    pub async fn mark_message_read(&self, message_id: i64, receiver_id: i64) -> Result<Message, MessagingError> {
        self.db.mark_message_read(message_id, receiver_id).await
    }

    pub async fn notifications(&self, user_id: i64) -> Result<NotificationFeed, MessagingError> {
        self.db.fetch_notifications(user_id).await
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> Result<Notification, MessagingError> {
        self.db.mark_notification_read(notification_id, user_id).await
    }

    pub async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, MessagingError> {
        self.db.mark_all_notifications_read(user_id).await
    }

    pub async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), MessagingError> {
        self.db.delete_notification(notification_id, user_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
