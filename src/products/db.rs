//! Product store operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category_id: String,
    pub seller_id: String,
    pub image_url: Option<String>,
    pub quantity: i64,
    pub product_status: ProductStatus,
    pub average_rating: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new product; seller id comes from the caller's token.
pub struct NewProduct {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category_id: String,
    pub image_url: Option<String>,
    pub quantity: i64,
}

/// Optional fields for a product update.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub quantity: Option<i64>,
    pub product_status: Option<ProductStatus>,
}

const PRODUCT_COLUMNS: &str = "id, title, price, description, category_id, seller_id, image_url, \
     quantity, product_status, average_rating, rating_count, created_at, updated_at";

pub async fn create_product(
    pool: &SqlitePool,
    seller_id: &str,
    new: NewProduct,
) -> Result<Product, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO products
            (id, title, price, description, category_id, seller_id, image_url, quantity,
             product_status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'available', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.title)
    .bind(new.price)
    .bind(&new.description)
    .bind(&new.category_id)
    .bind(seller_id)
    .bind(&new.image_url)
    .bind(new.quantity)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Product {
        id,
        title: new.title,
        price: new.price,
        description: new.description,
        category_id: new.category_id,
        seller_id: seller_id.to_string(),
        image_url: new.image_url,
        quantity: new.quantity,
        product_status: ProductStatus::Available,
        average_rating: 0.0,
        rating_count: 0,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_product(pool: &SqlitePool, id: &str) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Listing with optional category and product id filters.
pub async fn list_products(
    pool: &SqlitePool,
    category_id: Option<&str>,
    product_id: Option<&str>,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS} FROM products
        WHERE (? IS NULL OR category_id = ?)
          AND (? IS NULL OR id = ?)
        ORDER BY created_at DESC
        "#
    ))
    .bind(category_id)
    .bind(category_id)
    .bind(product_id)
    .bind(product_id)
    .fetch_all(pool)
    .await
}

pub async fn list_products_by_seller(
    pool: &SqlitePool,
    seller_id: &str,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = ? ORDER BY created_at DESC"
    ))
    .bind(seller_id)
    .fetch_all(pool)
    .await
}

/// Apply a patch to a product owned by `seller_id`. Returns the number of
/// rows matched so callers can distinguish not-found/not-owned.
pub async fn update_product(
    pool: &SqlitePool,
    id: &str,
    seller_id: &str,
    patch: &ProductPatch,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            title = COALESCE(?, title),
            price = COALESCE(?, price),
            description = COALESCE(?, description),
            category_id = COALESCE(?, category_id),
            image_url = COALESCE(?, image_url),
            quantity = COALESCE(?, quantity),
            product_status = COALESCE(?, product_status),
            updated_at = ?
        WHERE id = ? AND seller_id = ?
        "#,
    )
    .bind(&patch.title)
    .bind(patch.price)
    .bind(&patch.description)
    .bind(&patch.category_id)
    .bind(&patch.image_url)
    .bind(patch.quantity)
    .bind(patch.product_status)
    .bind(Utc::now())
    .bind(id)
    .bind(seller_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Seller-scoped delete. Returns rows affected.
pub async fn delete_product(
    pool: &SqlitePool,
    id: &str,
    seller_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = ? AND seller_id = ?")
        .bind(id)
        .bind(seller_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Unconditional delete (admin).
pub async fn delete_product_unchecked(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
