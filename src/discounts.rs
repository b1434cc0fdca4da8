//! Negotiated per-buyer discounts.
//!
//! A discount is scoped to one (product, buyer) pair and carries an
//! expiry. At most one active discount exists per pair; submitting while
//! one is active updates it in place.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::auth::accounts::Role;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Discount {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub negotiated_price: f64,
    pub chat_id: String,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertDiscountRequest {
    pub product_id: String,
    pub user_id: String,
    pub negotiated_price: f64,
    pub chat_id: String,
    pub expiry: DateTime<Utc>,
}

const DISCOUNT_COLUMNS: &str = "id, product_id, user_id, negotiated_price, chat_id, expiry";

async fn require_product_seller(
    pool: &SqlitePool,
    product_id: &str,
    seller_id: &str,
) -> ApiResult<()> {
    let owner: Option<String> = sqlx::query_scalar("SELECT seller_id FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    match owner {
        None => Err(ApiError::not_found("Product not found")),
        Some(owner) if owner != seller_id => {
            Err(ApiError::forbidden("Only the product's seller can manage discounts"))
        }
        Some(_) => Ok(()),
    }
}

async fn active_discount(
    pool: &SqlitePool,
    product_id: &str,
    user_id: &str,
) -> Result<Option<Discount>, sqlx::Error> {
    sqlx::query_as::<_, Discount>(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE product_id = ? AND user_id = ? AND expiry > ?"
    ))
    .bind(product_id)
    .bind(user_id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}

/// Create a discount, or refresh the active one in place.
pub async fn upsert_discount(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<UpsertDiscountRequest>,
) -> ApiResult<(StatusCode, Json<Discount>)> {
    user.require_role(Role::Seller)?;
    require_product_seller(&pool, &request.product_id, &user.id).await?;

    if request.negotiated_price <= 0.0 {
        return Err(ApiError::validation("Negotiated price must be positive"));
    }
    if request.expiry <= Utc::now() {
        return Err(ApiError::validation("Expiry must be a future date"));
    }

    if let Some(existing) = active_discount(&pool, &request.product_id, &request.user_id).await? {
        sqlx::query("UPDATE discounts SET negotiated_price = ?, chat_id = ?, expiry = ? WHERE id = ?")
            .bind(request.negotiated_price)
            .bind(&request.chat_id)
            .bind(request.expiry)
            .bind(&existing.id)
            .execute(&pool)
            .await?;

        return Ok((
            StatusCode::OK,
            Json(Discount {
                negotiated_price: request.negotiated_price,
                chat_id: request.chat_id,
                expiry: request.expiry,
                ..existing
            }),
        ));
    }

    let discount = Discount {
        id: uuid::Uuid::new_v4().to_string(),
        product_id: request.product_id,
        user_id: request.user_id,
        negotiated_price: request.negotiated_price,
        chat_id: request.chat_id,
        expiry: request.expiry,
    };

    sqlx::query(
        r#"
        INSERT INTO discounts (id, product_id, user_id, negotiated_price, chat_id, expiry)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&discount.id)
    .bind(&discount.product_id)
    .bind(&discount.user_id)
    .bind(discount.negotiated_price)
    .bind(&discount.chat_id)
    .bind(discount.expiry)
    .execute(&pool)
    .await?;

    tracing::info!(
        "Discount created for product {} / buyer {}",
        discount.product_id,
        discount.user_id
    );

    Ok((StatusCode::CREATED, Json(discount)))
}

/// Buyer view: the caller's own active discount for a product.
pub async fn get_my_discount(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Discount>> {
    user.require_role(Role::Client)?;

    let discount = active_discount(&pool, &product_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("No active discount"))?;
    Ok(Json(discount))
}

/// Seller view: the active discount granted to a specific buyer.
pub async fn get_discount_for_buyer(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path((product_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Discount>> {
    user.require_role(Role::Seller)?;
    require_product_seller(&pool, &product_id, &user.id).await?;

    let discount = active_discount(&pool, &product_id, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No active discount"))?;
    Ok(Json(discount))
}

pub async fn delete_discount(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_role(Role::Seller)?;

    let discount = sqlx::query_as::<_, Discount>(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?"
    ))
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Discount not found"))?;

    require_product_seller(&pool, &discount.product_id, &user.id).await?;

    sqlx::query("DELETE FROM discounts WHERE id = ?")
        .bind(&id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "message": "Discount deleted successfully" })))
}
