//! Chat store operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Seen,
}

/// A conversation between one client and one seller about one product.
/// Product and client names are denormalized at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chat {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub client_id: String,
    pub client_name: String,
    pub seller_id: String,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.client_id == user_id || self.seller_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    /// Append order within the store, assigned on insert.
    pub seq: i64,
    pub chat_id: String,
    pub sender_id: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub is_image: bool,
    pub status: MessageStatus,
}

/// Seller overview row: a chat plus its most recent message, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOverview {
    #[serde(flatten)]
    pub chat: Chat,
    pub last_message: Option<ChatMessage>,
}

const CHAT_COLUMNS: &str = "id, product_id, product_name, client_id, client_name, seller_id, created_at";

const MESSAGE_COLUMNS: &str = "seq, chat_id, sender_id, body, timestamp, is_image, status";

/// Find or create the chat for a (product, client, seller) triple.
/// Repeated initiations return the same conversation; the flag reports
/// whether a new chat was created.
pub async fn get_or_create_chat(
    pool: &SqlitePool,
    product_id: &str,
    product_name: &str,
    client_id: &str,
    client_name: &str,
    seller_id: &str,
) -> Result<(Chat, bool), sqlx::Error> {
    if let Some(chat) = find_chat(pool, product_id, client_id, seller_id).await? {
        return Ok((chat, false));
    }

    let chat = Chat {
        id: uuid::Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        product_name: product_name.to_string(),
        client_id: client_id.to_string(),
        client_name: client_name.to_string(),
        seller_id: seller_id.to_string(),
        created_at: Utc::now(),
    };

    // A concurrent initiation can win the race; the unique index makes the
    // insert a no-op and the reread returns the winner's row.
    let inserted = sqlx::query(
        r#"
        INSERT INTO chats (id, product_id, product_name, client_id, client_name, seller_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (product_id, client_id, seller_id) DO NOTHING
        "#,
    )
    .bind(&chat.id)
    .bind(&chat.product_id)
    .bind(&chat.product_name)
    .bind(&chat.client_id)
    .bind(&chat.client_name)
    .bind(&chat.seller_id)
    .bind(chat.created_at)
    .execute(pool)
    .await?;

    if inserted.rows_affected() == 1 {
        return Ok((chat, true));
    }

    match find_chat(pool, product_id, client_id, seller_id).await? {
        Some(chat) => Ok((chat, false)),
        None => Err(sqlx::Error::RowNotFound),
    }
}

async fn find_chat(
    pool: &SqlitePool,
    product_id: &str,
    client_id: &str,
    seller_id: &str,
) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>(&format!(
        "SELECT {CHAT_COLUMNS} FROM chats WHERE product_id = ? AND client_id = ? AND seller_id = ?"
    ))
    .bind(product_id)
    .bind(client_id)
    .bind(seller_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_chat(pool: &SqlitePool, id: &str) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_chats_by_client(
    pool: &SqlitePool,
    client_id: &str,
) -> Result<Vec<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>(&format!(
        "SELECT {CHAT_COLUMNS} FROM chats WHERE client_id = ? ORDER BY created_at DESC"
    ))
    .bind(client_id)
    .fetch_all(pool)
    .await
}

pub async fn list_chats_by_seller(
    pool: &SqlitePool,
    seller_id: &str,
) -> Result<Vec<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>(&format!(
        "SELECT {CHAT_COLUMNS} FROM chats WHERE seller_id = ? ORDER BY created_at DESC"
    ))
    .bind(seller_id)
    .fetch_all(pool)
    .await
}

/// Persist a message and return it with its store-assigned sequence.
pub async fn insert_message(
    pool: &SqlitePool,
    chat_id: &str,
    sender_id: &str,
    body: &str,
    is_image: bool,
) -> Result<ChatMessage, sqlx::Error> {
    let timestamp = Utc::now();

    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO chat_messages (chat_id, sender_id, body, timestamp, is_image, status)
        VALUES (?, ?, ?, ?, ?, 'sent')
        RETURNING seq
        "#,
    )
    .bind(chat_id)
    .bind(sender_id)
    .bind(body)
    .bind(timestamp)
    .bind(is_image)
    .fetch_one(pool)
    .await?;

    Ok(ChatMessage {
        seq,
        chat_id: chat_id.to_string(),
        sender_id: sender_id.to_string(),
        body: body.to_string(),
        timestamp,
        is_image,
        status: MessageStatus::Sent,
    })
}

/// Messages in append order.
pub async fn list_messages(
    pool: &SqlitePool,
    chat_id: &str,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE chat_id = ? ORDER BY seq"
    ))
    .bind(chat_id)
    .fetch_all(pool)
    .await
}

pub async fn latest_message(
    pool: &SqlitePool,
    chat_id: &str,
) -> Result<Option<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE chat_id = ? ORDER BY seq DESC LIMIT 1"
    ))
    .bind(chat_id)
    .fetch_optional(pool)
    .await
}

/// Flip the message with exactly this timestamp to seen. The timestamp is
/// the only correlation key; duplicates are not disambiguated. Returns the
/// number of messages updated.
pub async fn mark_seen(
    pool: &SqlitePool,
    chat_id: &str,
    timestamp: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE chat_messages SET status = 'seen' WHERE chat_id = ? AND timestamp = ?")
            .bind(chat_id)
            .bind(timestamp)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

/// Messages cascade via the schema's ON DELETE.
pub async fn delete_chat(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM chats WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
