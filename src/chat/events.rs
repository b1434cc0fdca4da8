//! Realtime chat events.
//!
//! Only `NewMessage` and `MessageSeen` reflect persisted state; typing and
//! presence events are broadcast-only and leave no trace in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::db::ChatMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatEvent {
    /// A message was persisted and should be rendered by the other side.
    NewMessage { message: ChatMessage },

    /// Messages up to `timestamp` were read by `reader_id`.
    MessageSeen {
        chat_id: String,
        reader_id: String,
        timestamp: DateTime<Utc>,
    },

    Typing {
        chat_id: String,
        sender_id: String,
    },

    Online {
        chat_id: String,
        sender_id: String,
    },

    Offline {
        chat_id: String,
        sender_id: String,
    },
}

impl ChatEvent {
    /// Presence and typing events carry a sender the stream uses to avoid
    /// echoing a subscriber's own activity back at them.
    pub fn presence_sender(&self) -> Option<&str> {
        match self {
            ChatEvent::Typing { sender_id, .. }
            | ChatEvent::Online { sender_id, .. }
            | ChatEvent::Offline { sender_id, .. } => Some(sender_id),
            ChatEvent::NewMessage { .. } | ChatEvent::MessageSeen { .. } => None,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::NewMessage { .. } => "newMessage",
            ChatEvent::MessageSeen { .. } => "messageSeen",
            ChatEvent::Typing { .. } => "typing",
            ChatEvent::Online { .. } => "online",
            ChatEvent::Offline { .. } => "offline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_sender_only_for_ephemeral_events() {
        let typing = ChatEvent::Typing {
            chat_id: "c".into(),
            sender_id: "u1".into(),
        };
        assert_eq!(typing.presence_sender(), Some("u1"));

        let seen = ChatEvent::MessageSeen {
            chat_id: "c".into(),
            reader_id: "u2".into(),
            timestamp: Utc::now(),
        };
        assert_eq!(seen.presence_sender(), None);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let typing = ChatEvent::Typing {
            chat_id: "c".into(),
            sender_id: "u1".into(),
        };
        let json = serde_json::to_value(&typing).unwrap();
        assert_eq!(json["type"], "typing");
        assert_eq!(json["chat_id"], "c");
    }
}
