use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use log::*;
use tokio::sync::{mpsc::UnboundedSender, RwLock};

use super::ServerFrame;

pub type ConnId = u64;

/// The live connection-to-room mapping.
///
/// This is the one piece of inherently process-local mutable state in the real-time layer, so it
/// is an explicit object created at server start and handed to the sessions and event hooks that
/// need it, never a module-level singleton. Tests substitute their own instance.
///
/// A room holds the send halves of its member sessions. Sending is fire-and-forget: a send
/// failure means the session is gone, and the dead sender is pruned on the spot.
#[derive(Default)]
pub struct MulticastRegistry {
    next_conn_id: AtomicU64,
    rooms: RwLock<HashMap<String, HashMap<ConnId, UnboundedSender<ServerFrame>>>>,
}

impl MulticastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a process-unique connection id.
    pub fn new_connection(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn join(&self, room: &str, conn_id: ConnId, sender: UnboundedSender<ServerFrame>) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(room.to_string()).or_default().insert(conn_id, sender);
        trace!("📡️ Connection {conn_id} joined {room}");
    }

    /// Remove a connection from every room it joined. Called on disconnect.
    pub async fn leave_all(&self, conn_id: ConnId) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|room, members| {
            if members.remove(&conn_id).is_some() {
                trace!("📡️ Connection {conn_id} left {room}");
            }
            !members.is_empty()
        });
    }

    /// Multicast a frame to every live member of a room. Dead members are pruned; the number of
    /// successful deliveries is returned. Failures are swallowed here on purpose: a push must
    /// never fail the operation that produced it.
    pub async fn broadcast(&self, room: &str, frame: &ServerFrame) -> usize {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(room) else {
            trace!("📡️ Nobody home in {room}");
            return 0;
        };
        let mut delivered = 0;
        members.retain(|conn_id, sender| match sender.send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            },
            Err(_) => {
                debug!("📡️ Pruning dead connection {conn_id} from {room}");
                false
            },
        });
        if members.is_empty() {
            rooms.remove(room);
        }
        delivered
    }

    pub async fn room_size(&self, room: &str) -> usize {
        self.rooms.read().await.get(room).map(|m| m.len()).unwrap_or(0)
    }
}
