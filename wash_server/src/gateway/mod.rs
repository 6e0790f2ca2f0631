//! The real-time gateway.
//!
//! One WebSocket connection per client, authenticated at handshake time with the same bearer
//! token as the HTTP API. Every authenticated connection is placed into its user's private room
//! (`user:<id>`) and may additionally join per-reservation rooms (`job:<id>`) for location
//! pings. Delivery is at-most-once and fire-and-forget: durability comes from the database write
//! that precedes every push, so a disconnected client simply re-fetches on reconnect.

mod registry;
mod session;

use chrono::{DateTime, Utc};
pub use registry::{ConnId, MulticastRegistry};
use serde::{Deserialize, Serialize};
pub use session::ws_handshake;
use wash_engine::db_types::{Message, Notification};

pub fn user_room(user_id: i64) -> String {
    format!("user:{user_id}")
}

pub fn job_room(reservation_id: i64) -> String {
    format!("job:{reservation_id}")
}

/// Client → server frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Send a direct message. The message is persisted before anyone sees it live.
    SendMessage { to: i64, content: String },
    /// Join the room of a reservation to receive its location pings.
    JoinJob { reservation_id: i64 },
    /// Application-level keep-alive.
    Ping,
}

/// Server → client frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A chat message. Delivered to the recipient's room and echoed to the sender.
    NewMessage { message: Message },
    /// A persisted notification for this user.
    Notification { notification: Notification },
    /// A location/ETA ping for a job room.
    Location {
        reservation_id: i64,
        washer_id: i64,
        eta: DateTime<Utc>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
    /// Something about the last client frame was wrong. The connection stays open.
    Error { message: String },
    Pong,
}
