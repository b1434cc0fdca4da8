//! Chat route handlers: initiation, SSE subscription, message send and
//! seen receipts, presence signals, and chat listings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
};
use chrono::{DateTime, Utc};
use futures_util::stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::auth::accounts::Role;
use crate::chat::db::{self, Chat, ChatMessage, ChatOverview};
use crate::chat::events::ChatEvent;
use crate::chat::state::ChatRooms;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitiateChatRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
    #[serde(default)]
    pub is_image: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeenRequest {
    pub timestamp: DateTime<Utc>,
}

async fn participant_chat(
    state: &AppState,
    chat_id: &str,
    user_id: &str,
) -> ApiResult<Chat> {
    let chat = db::get_chat(&state.pool, chat_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Chat not found"))?;
    if !chat.has_participant(user_id) {
        return Err(ApiError::forbidden("Not a participant of this chat"));
    }
    Ok(chat)
}

/// Start (or resume) a conversation about a product.
///
/// Idempotent per (product, client, seller): repeated initiations return
/// the same chat with 200 instead of 201.
pub async fn initiate_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<InitiateChatRequest>,
) -> ApiResult<(StatusCode, Json<Chat>)> {
    user.require_role(Role::Client)?;

    let product = sqlx::query_as::<_, (String, String)>(
        "SELECT seller_id, title FROM products WHERE id = ?",
    )
    .bind(&request.product_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Product not found"))?;
    let (seller_id, product_name) = product;

    let account = crate::auth::accounts::get_account_by_id(&state.pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    let client_name = account.full_name();
    let (chat, created) = db::get_or_create_chat(
        &state.pool,
        &request.product_id,
        &product_name,
        &user.id,
        &client_name,
        &seller_id,
    )
    .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(chat)))
}

/// Join a chat's event stream (SSE).
///
/// Subscribing has no persistence effect. Presence events produced by the
/// subscriber are filtered out so nobody hears their own typing.
pub async fn chat_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
) -> ApiResult<Sse<impl futures_util::Stream<Item = Result<Event, axum::Error>>>> {
    let chat = participant_chat(&state, &chat_id, &user.id).await?;

    let rooms = state.chat_rooms.clone();
    let rx = rooms.subscribe(&chat.id);

    rooms.broadcast(
        &chat.id,
        ChatEvent::Online {
            chat_id: chat.id.clone(),
            sender_id: user.id.clone(),
        },
    );

    // Announces offline when the SSE connection goes away.
    let guard = PresenceGuard {
        rooms,
        chat_id: chat.id.clone(),
        user_id: user.id.clone(),
    };

    let subscriber_id = user.id.clone();
    let stream = stream::unfold(
        (rx, subscriber_id, guard),
        |(mut rx, subscriber_id, guard)| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        // Skip the subscriber's own presence signals.
                        if event.presence_sender() == Some(subscriber_id.as_str()) {
                            continue;
                        }
                        let data = match serde_json::to_string(&event) {
                            Ok(data) => data,
                            Err(e) => {
                                tracing::error!("Failed to serialize chat event: {e}");
                                continue;
                            }
                        };
                        let sse_event = Event::default().event(event.event_name()).data(data);
                        return Some((Ok(sse_event), (rx, subscriber_id, guard)));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Chat subscriber lagged, skipped {skipped} events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

struct PresenceGuard {
    rooms: ChatRooms,
    chat_id: String,
    user_id: String,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        self.rooms.broadcast(
            &self.chat_id,
            ChatEvent::Offline {
                chat_id: self.chat_id.clone(),
                sender_id: self.user_id.clone(),
            },
        );
    }
}

/// Append a message, then broadcast it.
///
/// A message that failed to persist is never broadcast.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let chat = participant_chat(&state, &chat_id, &user.id).await?;

    if request.body.trim().is_empty() {
        return Err(ApiError::validation("Message body is required"));
    }

    let message =
        db::insert_message(&state.pool, &chat.id, &user.id, &request.body, request.is_image)
            .await?;

    state.chat_rooms.broadcast(
        &chat.id,
        ChatEvent::NewMessage {
            message: message.clone(),
        },
    );

    Ok((StatusCode::CREATED, Json(message)))
}

/// Mark the message with this exact timestamp as seen.
pub async fn mark_seen(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
    Json(request): Json<SeenRequest>,
) -> ApiResult<Json<Value>> {
    let chat = participant_chat(&state, &chat_id, &user.id).await?;

    let updated = db::mark_seen(&state.pool, &chat.id, request.timestamp).await?;
    if updated > 0 {
        state.chat_rooms.broadcast(
            &chat.id,
            ChatEvent::MessageSeen {
                chat_id: chat.id.clone(),
                reader_id: user.id.clone(),
                timestamp: request.timestamp,
            },
        );
    }

    Ok(Json(json!({ "updated": updated })))
}

/// Broadcast-only typing signal; nothing is persisted.
pub async fn typing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
) -> ApiResult<StatusCode> {
    let chat = participant_chat(&state, &chat_id, &user.id).await?;

    state.chat_rooms.broadcast(
        &chat.id,
        ChatEvent::Typing {
            chat_id: chat.id.clone(),
            sender_id: user.id,
        },
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Message history in append order.
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let chat = participant_chat(&state, &chat_id, &user.id).await?;
    let messages = db::list_messages(&state.pool, &chat.id).await?;
    Ok(Json(messages))
}

pub async fn get_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Chat>> {
    let chat = participant_chat(&state, &chat_id, &user.id).await?;
    Ok(Json(chat))
}

/// Seller overview: each chat with its latest message.
pub async fn list_seller_chats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ChatOverview>>> {
    user.require_role(Role::Seller)?;

    let chats = db::list_chats_by_seller(&state.pool, &user.id).await?;
    let mut out = Vec::with_capacity(chats.len());
    for chat in chats {
        let last_message = db::latest_message(&state.pool, &chat.id).await?;
        out.push(ChatOverview { chat, last_message });
    }
    Ok(Json(out))
}

pub async fn list_client_chats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Chat>>> {
    user.require_role(Role::Client)?;
    let chats = db::list_chats_by_client(&state.pool, &user.id).await?;
    Ok(Json(chats))
}

/// Remove a conversation. Only the seller side may delete.
pub async fn delete_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let chat = participant_chat(&state, &chat_id, &user.id).await?;
    if chat.seller_id != user.id {
        return Err(ApiError::forbidden("Only the seller can delete a chat"));
    }

    db::delete_chat(&state.pool, &chat.id).await?;

    Ok(Json(json!({ "message": "Chat deleted successfully" })))
}
