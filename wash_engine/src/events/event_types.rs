use chrono::{DateTime, Utc};

use crate::db_types::{Message, Notification};

/// A notification row was committed and should be pushed to its user's private room.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub notification: Notification,
}

impl NotificationEvent {
    pub fn new(notification: Notification) -> Self {
        Self { notification }
    }
}

/// A direct message was committed. Delivered to the recipient's private room and echoed to the
/// sender so their UI can confirm the send.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub message: Message,
}

impl MessageEvent {
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

/// A washer updated their ETA/position for a job. Delivered to everyone in the job's room.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEvent {
    pub reservation_id: i64,
    pub washer_id: i64,
    pub eta: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
