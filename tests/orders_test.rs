//! Order lifecycle tests: transactional creation, status transitions,
//! stock restoration, and deletion rules.

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::json;

use bazaar::auth::accounts::Role;
use common::{create_account, product_quantity, seed_product, spawn_app, TestAccount, TestApp};

async fn place_order(
    app: &TestApp,
    client: &TestAccount,
    seller_id: &str,
    product_id: &str,
    quantity: i64,
) -> axum_test::TestResponse {
    app.server
        .post("/api/client/orders")
        .authorization_bearer(&client.token)
        .json(&json!({
            "user_id": client.id,
            "items": [{
                "product_id": product_id,
                "seller_id": seller_id,
                "quantity": quantity,
                "price": 25.0,
                "image": null
            }],
            "total": 25.0 * quantity as f64,
            "payment_method": "bank_transfer",
            "account_holder_name": "Test Client",
            "account_number": "12345678",
            "transaction_id": "txn-1",
            "shipping_address": { "city": "Test City", "street": "1 Test St" },
            "order_date": Utc::now().to_rfc3339()
        }))
        .await
}

async fn set_status(
    app: &TestApp,
    admin: &TestAccount,
    order_id: &str,
    status: &str,
) -> axum_test::TestResponse {
    app.server
        .put(&format!("/api/admin/orders/{order_id}/status"))
        .authorization_bearer(&admin.token)
        .json(&json!({ "status": status }))
        .await
}

#[tokio::test]
async fn creating_an_order_decrements_stock() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let response = place_order(&app, &client, &seller.id, &product_id, 4).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["items"][0]["quantity"], 4);
    assert_eq!(product_quantity(&app.pool, &product_id).await, 6);
}

#[tokio::test]
async fn orders_without_an_order_date_are_rejected() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let response = app
        .server
        .post("/api/client/orders")
        .authorization_bearer(&client.token)
        .json(&json!({
            "user_id": client.id,
            "items": [{
                "product_id": product_id,
                "seller_id": seller.id,
                "quantity": 1,
                "price": 25.0,
                "image": null
            }],
            "total": 25.0,
            "payment_method": "bank_transfer",
            "account_holder_name": "Test Client",
            "account_number": "12345678",
            "transaction_id": "txn-0",
            "shipping_address": { "city": "Test City" }
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    // Nothing was persisted and no stock moved.
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(product_quantity(&app.pool, &product_id).await, 10);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_whole_order() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 3, 25.0).await;

    let response = place_order(&app, &client, &seller.id, &product_id, 5).await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(product_quantity(&app.pool, &product_id).await, 3);

    // The order must not exist in any form.
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(items, 0);
}

#[tokio::test]
async fn canceling_restores_stock() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let created: serde_json::Value = place_order(&app, &client, &seller.id, &product_id, 4)
        .await
        .json();
    let order_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(product_quantity(&app.pool, &product_id).await, 6);

    let response = set_status(&app, &admin, &order_id, "canceled").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(product_quantity(&app.pool, &product_id).await, 10);
}

#[tokio::test]
async fn completing_sets_delivery_date_three_days_out() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let created: serde_json::Value = place_order(&app, &client, &seller.id, &product_id, 1)
        .await
        .json();
    let order_id = created["id"].as_str().unwrap().to_string();
    let order_date: DateTime<Utc> = created["order_date"].as_str().unwrap().parse().unwrap();

    let response = set_status(&app, &admin, &order_id, "completed").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    let delivery: DateTime<Utc> = body["delivery_date"].as_str().unwrap().parse().unwrap();
    assert_eq!(delivery, order_date + chrono::Duration::days(3));

    // Completion does not restore stock.
    assert_eq!(product_quantity(&app.pool, &product_id).await, 9);

    // Replaying the same transition changes nothing.
    let replay = set_status(&app, &admin, &order_id, "completed").await;
    assert_eq!(replay.status_code(), StatusCode::OK);
    let replay_body: serde_json::Value = replay.json();
    assert_eq!(replay_body["delivery_date"], body["delivery_date"]);
}

#[tokio::test]
async fn terminal_orders_reject_further_transitions() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let created: serde_json::Value = place_order(&app, &client, &seller.id, &product_id, 2)
        .await
        .json();
    let order_id = created["id"].as_str().unwrap().to_string();

    set_status(&app, &admin, &order_id, "completed").await;

    let response = set_status(&app, &admin, &order_id, "canceled").await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    // No stock restoration happened on the rejected transition.
    assert_eq!(product_quantity(&app.pool, &product_id).await, 8);
}

#[tokio::test]
async fn only_terminal_orders_can_be_deleted() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let created: serde_json::Value = place_order(&app, &client, &seller.id, &product_id, 1)
        .await
        .json();
    let order_id = created["id"].as_str().unwrap().to_string();

    let premature = app
        .server
        .delete(&format!("/api/admin/orders/{order_id}"))
        .authorization_bearer(&admin.token)
        .await;
    assert_eq!(premature.status_code(), StatusCode::CONFLICT);

    set_status(&app, &admin, &order_id, "canceled").await;

    let allowed = app
        .server
        .delete(&format!("/api/admin/orders/{order_id}"))
        .authorization_bearer(&admin.token)
        .await;
    assert_eq!(allowed.status_code(), StatusCode::OK);

    // Line items cascade with the order.
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = ?")
        .bind(&order_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(items, 0);
}

#[tokio::test]
async fn status_transitions_require_the_admin_role() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let created: serde_json::Value = place_order(&app, &client, &seller.id, &product_id, 1)
        .await
        .json();
    let order_id = created["id"].as_str().unwrap().to_string();

    let response = set_status(&app, &client, &order_id, "completed").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn seller_listing_prunes_items_to_their_own() {
    let app = spawn_app().await;
    let seller_a = create_account(&app.pool, "a@example.com", Role::Seller).await;
    let seller_b = create_account(&app.pool, "b@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_a = seed_product(&app.pool, &seller_a.id, 10, 25.0).await;
    let product_b = seed_product(&app.pool, &seller_b.id, 10, 25.0).await;

    let response = app
        .server
        .post("/api/client/orders")
        .authorization_bearer(&client.token)
        .json(&json!({
            "user_id": client.id,
            "items": [
                { "product_id": product_a, "seller_id": seller_a.id, "quantity": 1, "price": 25.0, "image": null },
                { "product_id": product_b, "seller_id": seller_b.id, "quantity": 2, "price": 25.0, "image": null },
            ],
            "total": 75.0,
            "payment_method": "bank_transfer",
            "account_holder_name": "Test Client",
            "account_number": "12345678",
            "transaction_id": "txn-2",
            "shipping_address": { "city": "Test City" },
            "order_date": Utc::now().to_rfc3339()
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let listing = app
        .server
        .get(&format!("/api/seller/orders/{}", seller_a.id))
        .authorization_bearer(&seller_a.token)
        .await;
    assert_eq!(listing.status_code(), StatusCode::OK);

    let body: serde_json::Value = listing.json();
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    let items = orders[0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"], product_a.as_str());
    // created_at is aliased from the order date.
    assert!(orders[0]["created_at"].is_string());
}
