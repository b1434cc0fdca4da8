//! Server initialization.
//!
//! `connect_pool` opens the process-scoped store pool and runs migrations;
//! `create_app` wires the router and starts the background task that
//! garbage-collects subscriber-free chat rooms.

use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

use crate::routes::router::create_router;
use crate::server::state::AppState;

/// Interval between sweeps of inactive chat broadcast channels.
const ROOM_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Open the store pool and bring the schema up to date.
pub async fn connect_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Store connection pool created");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations complete");

    Ok(pool)
}

/// Build the application router and spawn the chat-room cleanup task.
pub fn create_app(state: AppState) -> Router {
    let rooms = state.chat_rooms.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ROOM_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            rooms.cleanup_inactive();
            tracing::debug!("Swept inactive chat rooms");
        }
    });

    create_router(state)
}
