//! Product route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::auth::accounts::Role;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::products::db::{self, NewProduct, Product, ProductPatch};
use crate::products::inventory::{self, QuantityItem};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category_id: String,
    pub image_url: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityBatch {
    pub items: Vec<QuantityItem>,
}

/// Create a product owned by the authenticated seller.
pub async fn create_product(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.require_role(Role::Seller)?;

    if request.title.trim().is_empty() || request.description.trim().is_empty() {
        return Err(ApiError::validation("Title and description are required"));
    }
    if request.price <= 0.0 {
        return Err(ApiError::validation("Price must be positive"));
    }
    if request.quantity < 0 {
        return Err(ApiError::validation("Quantity cannot be negative"));
    }

    let product = db::create_product(
        &pool,
        &user.id,
        NewProduct {
            title: request.title.trim().to_string(),
            price: request.price,
            description: request.description,
            category_id: request.category_id,
            image_url: request.image_url,
            quantity: request.quantity,
        },
    )
    .await?;

    tracing::info!("Product created: {} by seller {}", product.id, user.id);

    Ok((StatusCode::CREATED, Json(product)))
}

/// Public catalog listing with optional category/product filters.
pub async fn list_products(
    State(pool): State<SqlitePool>,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = db::list_products(
        &pool,
        filter.category_id.as_deref(),
        filter.product_id.as_deref(),
    )
    .await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = db::get_product(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(product))
}

/// Products owned by the authenticated seller.
pub async fn list_my_products(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Product>>> {
    user.require_role(Role::Seller)?;
    let products = db::list_products_by_seller(&pool, &user.id).await?;
    Ok(Json(products))
}

/// Partial update, restricted to the owning seller.
pub async fn update_product(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> ApiResult<Json<Product>> {
    user.require_role(Role::Seller)?;

    if let Some(price) = patch.price {
        if price <= 0.0 {
            return Err(ApiError::validation("Price must be positive"));
        }
    }
    if let Some(quantity) = patch.quantity {
        if quantity < 0 {
            return Err(ApiError::validation("Quantity cannot be negative"));
        }
    }

    let updated = db::update_product(&pool, &id, &user.id, &patch).await?;
    if updated == 0 {
        return Err(ApiError::not_found("Product not found"));
    }

    let product = db::get_product(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(product))
}

/// Delete a product owned by the authenticated seller.
pub async fn delete_product(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_role(Role::Seller)?;

    let deleted = db::delete_product(&pool, &id, &user.id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Product not found"));
    }

    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// Batch stock decrement. The whole batch commits or none of it does.
pub async fn decrease_quantities(
    State(pool): State<SqlitePool>,
    Json(batch): Json<QuantityBatch>,
) -> ApiResult<Json<Value>> {
    let mut tx = pool.begin().await?;
    inventory::decrease_quantities(&mut *tx, &batch.items).await?;
    tx.commit().await?;

    Ok(Json(json!({ "message": "Quantities decreased successfully" })))
}

/// Batch stock restore, the inverse of `decrease_quantities`.
pub async fn increase_quantities(
    State(pool): State<SqlitePool>,
    Json(batch): Json<QuantityBatch>,
) -> ApiResult<Json<Value>> {
    let mut tx = pool.begin().await?;
    inventory::increase_quantities(&mut *tx, &batch.items).await?;
    tx.commit().await?;

    Ok(Json(json!({ "message": "Quantities increased successfully" })))
}
