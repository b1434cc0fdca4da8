//! Shared test fixtures: an in-memory store, a test server over the full
//! router, and account helpers.

#![allow(dead_code)]

use axum_test::TestServer;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use bazaar::auth::accounts::{self, Role};
use bazaar::auth::create_token;
use bazaar::routes::create_router;
use bazaar::server::config::AppConfig;
use bazaar::AppState;

/// A running application over an in-memory store.
pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub state: AppState,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        smtp: None,
    }
}

pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory store");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

pub async fn spawn_app() -> TestApp {
    let pool = test_pool().await;
    let state = AppState::new(pool.clone(), test_config());
    let server = TestServer::new(create_router(state.clone())).expect("failed to start test server");

    TestApp {
        server,
        pool,
        state,
    }
}

/// A registered account with a valid bearer token.
pub struct TestAccount {
    pub id: String,
    pub email: String,
    pub token: String,
    pub role: Role,
}

/// Create an account directly in the store and mint a token for it.
/// Bypasses the signup endpoint so admin accounts can be provisioned too.
pub async fn create_account(pool: &SqlitePool, email: &str, role: Role) -> TestAccount {
    let password_hash = bcrypt::hash("password123", 4).expect("hash");
    let account = accounts::create_account(pool, "Test", "User", email, &password_hash, role)
        .await
        .expect("failed to create account");

    let token = create_token(&account.id, &account.email, role).expect("failed to mint token");

    TestAccount {
        id: account.id,
        email: account.email,
        token,
        role,
    }
}

/// Insert a category and a product owned by `seller_id`, returning the
/// product id.
pub async fn seed_product(pool: &SqlitePool, seller_id: &str, quantity: i64, price: f64) -> String {
    let category_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now();

    sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&category_id)
        .bind("Test Category")
        .bind(now)
        .execute(pool)
        .await
        .expect("failed to seed category");

    let product_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO products
            (id, title, price, description, category_id, seller_id, quantity, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&product_id)
    .bind("Test Product")
    .bind(price)
    .bind("A product under test")
    .bind(&category_id)
    .bind(seller_id)
    .bind(quantity)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("failed to seed product");

    product_id
}

pub async fn product_quantity(pool: &SqlitePool, product_id: &str) -> i64 {
    sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("failed to read quantity")
}
