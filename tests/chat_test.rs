//! Chat relay tests: idempotent initiation, persist-then-broadcast
//! delivery, append ordering, and seen receipts.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use bazaar::auth::accounts::Role;
use bazaar::chat::ChatEvent;
use common::{create_account, seed_product, spawn_app, TestAccount, TestApp};

async fn initiate(
    app: &TestApp,
    client: &TestAccount,
    product_id: &str,
) -> axum_test::TestResponse {
    app.server
        .post("/api/chat/initiate")
        .authorization_bearer(&client.token)
        .json(&json!({ "product_id": product_id }))
        .await
}

async fn open_chat(app: &TestApp, client: &TestAccount, product_id: &str) -> String {
    let response = initiate(app, client, product_id).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn initiation_is_idempotent_per_triple() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;

    let first = initiate(&app, &client, &product_id).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    let first_body: serde_json::Value = first.json();

    // The repeat hits the existing chat and says so.
    let second = initiate(&app, &client, &product_id).await;
    assert_eq!(second.status_code(), StatusCode::OK);
    let second_body: serde_json::Value = second.json();
    assert_eq!(first_body["id"], second_body["id"]);

    let chats: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(chats, 1);
}

#[tokio::test]
async fn sent_messages_are_persisted_then_broadcast() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;
    let chat_id = open_chat(&app, &client, &product_id).await;

    let mut rx = app.state.chat_rooms.subscribe(&chat_id);

    let response = app
        .server
        .post(&format!("/api/chat/{chat_id}/messages"))
        .authorization_bearer(&client.token)
        .json(&json!({ "body": "Is this still available?" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let persisted: serde_json::Value = response.json();

    // The broadcast event carries the persisted record.
    let event = rx.recv().await.unwrap();
    match event {
        ChatEvent::NewMessage { message } => {
            assert_eq!(message.body, "Is this still available?");
            assert_eq!(message.sender_id, client.id);
            assert_eq!(message.seq, persisted["seq"].as_i64().unwrap());
        }
        other => panic!("expected NewMessage, got {other:?}"),
    }

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE chat_id = ?")
        .bind(&chat_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn rejected_messages_are_never_broadcast() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;
    let chat_id = open_chat(&app, &client, &product_id).await;

    let mut rx = app.state.chat_rooms.subscribe(&chat_id);

    let response = app
        .server
        .post(&format!("/api/chat/{chat_id}/messages"))
        .authorization_bearer(&client.token)
        .json(&json!({ "body": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    assert!(rx.try_recv().is_err());
    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE chat_id = ?")
        .bind(&chat_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn message_history_preserves_append_order() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;
    let chat_id = open_chat(&app, &client, &product_id).await;

    for body in ["one", "two", "three"] {
        let response = app
            .server
            .post(&format!("/api/chat/{chat_id}/messages"))
            .authorization_bearer(&client.token)
            .json(&json!({ "body": body }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let listing = app
        .server
        .get(&format!("/api/chat/{chat_id}/messages"))
        .authorization_bearer(&seller.token)
        .await;
    assert_eq!(listing.status_code(), StatusCode::OK);
    let messages: Vec<serde_json::Value> = listing.json();
    let bodies: Vec<&str> = messages
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn seen_flips_only_the_exact_timestamp() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;
    let chat_id = open_chat(&app, &client, &product_id).await;

    let sent: serde_json::Value = app
        .server
        .post(&format!("/api/chat/{chat_id}/messages"))
        .authorization_bearer(&client.token)
        .json(&json!({ "body": "hello" }))
        .await
        .json();
    let timestamp = sent["timestamp"].as_str().unwrap();

    let mut rx = app.state.chat_rooms.subscribe(&chat_id);

    let response = app
        .server
        .post(&format!("/api/chat/{chat_id}/seen"))
        .authorization_bearer(&seller.token)
        .json(&json!({ "timestamp": timestamp }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["updated"], 1);

    let status: String = sqlx::query_scalar("SELECT status FROM chat_messages WHERE chat_id = ?")
        .bind(&chat_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "seen");

    match rx.recv().await.unwrap() {
        ChatEvent::MessageSeen { reader_id, .. } => assert_eq!(reader_id, seller.id),
        other => panic!("expected MessageSeen, got {other:?}"),
    }

    // A non-matching timestamp flips nothing.
    let miss = app
        .server
        .post(&format!("/api/chat/{chat_id}/seen"))
        .authorization_bearer(&seller.token)
        .json(&json!({ "timestamp": "2001-01-01T00:00:00Z" }))
        .await;
    let miss_body: serde_json::Value = miss.json();
    assert_eq!(miss_body["updated"], 0);
}

#[tokio::test]
async fn typing_is_broadcast_but_never_persisted() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;
    let chat_id = open_chat(&app, &client, &product_id).await;

    let mut rx = app.state.chat_rooms.subscribe(&chat_id);

    let response = app
        .server
        .post(&format!("/api/chat/{chat_id}/typing"))
        .authorization_bearer(&client.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    match rx.recv().await.unwrap() {
        ChatEvent::Typing { sender_id, .. } => assert_eq!(sender_id, client.id),
        other => panic!("expected Typing, got {other:?}"),
    }

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE chat_id = ?")
        .bind(&chat_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn outsiders_cannot_join_or_post() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let outsider = create_account(&app.pool, "other@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;
    let chat_id = open_chat(&app, &client, &product_id).await;

    let post = app
        .server
        .post(&format!("/api/chat/{chat_id}/messages"))
        .authorization_bearer(&outsider.token)
        .json(&json!({ "body": "let me in" }))
        .await;
    assert_eq!(post.status_code(), StatusCode::FORBIDDEN);

    let get = app
        .server
        .get(&format!("/api/chat/{chat_id}"))
        .authorization_bearer(&outsider.token)
        .await;
    assert_eq!(get.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_the_seller_side_can_delete_a_chat() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 5, 25.0).await;
    let chat_id = open_chat(&app, &client, &product_id).await;

    let denied = app
        .server
        .delete(&format!("/api/chat/{chat_id}"))
        .authorization_bearer(&client.token)
        .await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

    let allowed = app
        .server
        .delete(&format!("/api/chat/{chat_id}"))
        .authorization_bearer(&seller.token)
        .await;
    assert_eq!(allowed.status_code(), StatusCode::OK);
}
