//! Per-chat broadcast channel registry.
//!
//! Each chat gets its own channel so events never cross between
//! conversations. Channels are created lazily on first use and reaped by a
//! periodic cleanup task once every subscriber has disconnected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::chat::events::ChatEvent;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct ChatRooms {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ChatEvent>>>>,
}

impl ChatRooms {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get or create the broadcast sender for a chat.
    pub fn sender(&self, chat_id: &str) -> broadcast::Sender<ChatEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(chat_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Subscribe to a chat's event stream.
    pub fn subscribe(&self, chat_id: &str) -> broadcast::Receiver<ChatEvent> {
        self.sender(chat_id).subscribe()
    }

    /// Broadcast an event to a chat's subscribers. A send error only means
    /// nobody is listening right now.
    pub fn broadcast(&self, chat_id: &str, event: ChatEvent) {
        let sender = {
            let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
            channels.get(chat_id).cloned()
        };
        if let Some(sender) = sender {
            if let Err(e) = sender.send(event) {
                tracing::debug!("No subscribers for chat {chat_id}: {e:?}");
            }
        }
    }

    /// Drop channels that no longer have any subscribers.
    pub fn cleanup_inactive(&self) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }

    pub fn subscriber_count(&self, chat_id: &str) -> usize {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .get(chat_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.len()
    }
}

impl Default for ChatRooms {
    fn default() -> Self {
        Self::new()
    }
}
