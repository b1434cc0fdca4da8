//! Application state shared across all request handlers.
//!
//! All durable state lives in the store; the only in-memory shared pieces
//! are the connection pool, the per-chat broadcast registry, and the
//! optional mailer. Everything here is cheap to clone.

use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::chat::state::ChatRooms;
use crate::mail::Mailer;
use crate::server::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    /// Process-scoped store connection pool, created once at startup.
    pub pool: SqlitePool,

    /// Per-chat broadcast channels for realtime delivery.
    pub chat_rooms: ChatRooms,

    /// Outbound mailer; `None` when SMTP is not configured.
    pub mailer: Option<Mailer>,

    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let mailer = config.smtp.as_ref().and_then(Mailer::new);
        AppState {
            pool,
            chat_rooms: ChatRooms::new(),
            mailer,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for ChatRooms {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.chat_rooms.clone()
    }
}
