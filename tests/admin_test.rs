//! Admin surface tests: dashboards, seller revenue, and bank accounts.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use bazaar::auth::accounts::Role;
use common::{create_account, seed_product, spawn_app};

#[tokio::test]
async fn totals_reflect_the_store() {
    let app = spawn_app().await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    create_account(&app.pool, "client@example.com", Role::Client).await;
    seed_product(&app.pool, &seller.id, 5, 25.0).await;

    let response = app
        .server
        .get("/api/admin/stats/totals")
        .authorization_bearer(&admin.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["total_clients"], 1);
    assert_eq!(body["total_sellers"], 1);
    assert_eq!(body["total_products"], 1);
    assert_eq!(body["total_orders"], 0);
}

#[tokio::test]
async fn stats_require_the_admin_role() {
    let app = spawn_app().await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;

    let response = app
        .server
        .get("/api/admin/stats/totals")
        .authorization_bearer(&seller.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn sold_products_apply_the_platform_fee() {
    let app = spawn_app().await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;
    let seller = create_account(&app.pool, "seller@example.com", Role::Seller).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;
    let product_id = seed_product(&app.pool, &seller.id, 10, 25.0).await;

    let created: serde_json::Value = app
        .server
        .post("/api/client/orders")
        .authorization_bearer(&client.token)
        .json(&json!({
            "user_id": client.id,
            "items": [{ "product_id": product_id, "seller_id": seller.id, "quantity": 4, "price": 50.0, "image": null }],
            "total": 200.0,
            "payment_method": "bank_transfer",
            "account_holder_name": "Test Client",
            "account_number": "12345678",
            "transaction_id": "txn-s",
            "shipping_address": { "city": "Test City" },
            "order_date": chrono::Utc::now().to_rfc3339()
        }))
        .await
        .json();
    let order_id = created["id"].as_str().unwrap();

    app.server
        .put(&format!("/api/admin/orders/{order_id}/status"))
        .authorization_bearer(&admin.token)
        .json(&json!({ "status": "completed" }))
        .await;

    let response = app
        .server
        .get("/api/seller/sold-products")
        .authorization_bearer(&seller.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let rows: Vec<serde_json::Value> = response.json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["units_sold"], 4);
    assert_eq!(rows[0]["total_price"], 200.0);
    assert_eq!(rows[0]["total_after_fee"], 190.0);
}

#[tokio::test]
async fn bank_accounts_filter_by_bank() {
    let app = spawn_app().await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;

    for (bank, holder) in [("Alpha Bank", "Ops A"), ("Beta Bank", "Ops B")] {
        let response = app
            .server
            .post("/api/admin/bank-accounts")
            .authorization_bearer(&admin.token)
            .json(&json!({
                "bank": bank,
                "account_holder_name": holder,
                "account_number": "0001"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    // Lookup is public (shown at checkout) and filterable.
    let response = app
        .server
        .get("/api/bank-accounts")
        .add_query_param("bank", "Alpha Bank")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let accounts: Vec<serde_json::Value> = response.json();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["bank"], "Alpha Bank");
}

#[tokio::test]
async fn admin_can_remove_accounts() {
    let app = spawn_app().await;
    let admin = create_account(&app.pool, "admin@example.com", Role::Admin).await;
    let client = create_account(&app.pool, "client@example.com", Role::Client).await;

    let response = app
        .server
        .delete(&format!("/api/admin/clients/{}", client.id))
        .authorization_bearer(&admin.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Deleting with the wrong role path misses.
    let missing = app
        .server
        .delete(&format!("/api/admin/sellers/{}", client.id))
        .authorization_bearer(&admin.token)
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}
