//! Realtime chat: one broadcast room per conversation, SSE delivery.
//!
//! The relay contract is persist-then-broadcast: a message is appended to
//! the store first and only broadcast once the append succeeded, so every
//! event a subscriber sees corresponds to a durable record. Typing and
//! presence signals are the exception; they are broadcast-only.

pub mod db;
pub mod events;
pub mod handlers;
pub mod state;

pub use db::{Chat, ChatMessage, MessageStatus};
pub use events::ChatEvent;
pub use state::ChatRooms;
