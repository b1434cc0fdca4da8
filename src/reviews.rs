//! Product reviews.
//!
//! Writing requires a completed purchase of the product, and each buyer
//! gets one review per product. Every write recomputes the product's
//! rating aggregate in the same transaction, so the reviews table stays
//! the single source of truth.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub username: String,
    pub profile_image: Option<String>,
    pub rating: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPage {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Review>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

const REVIEW_COLUMNS: &str =
    "id, product_id, user_id, username, profile_image, rating, comment, created_at, updated_at";

fn validate_rating(rating: i64) -> ApiResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::validation("Rating must be between 1 and 5"));
    }
    Ok(())
}

async fn has_completed_purchase(
    pool: &SqlitePool,
    user_id: &str,
    product_id: &str,
) -> Result<bool, sqlx::Error> {
    let exists: i64 = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = ? AND o.status = 'completed' AND oi.product_id = ?
        )
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

/// Refresh the product's rating aggregate from its reviews.
async fn recompute_aggregate(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE products SET
            average_rating = COALESCE((SELECT AVG(rating) FROM reviews WHERE product_id = ?), 0),
            rating_count = (SELECT COUNT(*) FROM reviews WHERE product_id = ?)
        WHERE id = ?
        "#,
    )
    .bind(product_id)
    .bind(product_id)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn create_review(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    validate_rating(request.rating)?;

    if !has_completed_purchase(&pool, &user.id, &request.product_id).await? {
        return Err(ApiError::forbidden(
            "Only buyers with a completed order can review this product",
        ));
    }

    let existing: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM reviews WHERE product_id = ? AND user_id = ?)",
    )
    .bind(&request.product_id)
    .bind(&user.id)
    .fetch_one(&pool)
    .await?;
    if existing != 0 {
        return Err(ApiError::conflict("You have already reviewed this product"));
    }

    let account = crate::auth::accounts::get_account_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    let now = Utc::now();
    let review = Review {
        id: uuid::Uuid::new_v4().to_string(),
        product_id: request.product_id,
        user_id: user.id.clone(),
        username: account.full_name(),
        profile_image: account.profile_image,
        rating: request.rating,
        comment: request.comment,
        created_at: now,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO reviews
            (id, product_id, user_id, username, profile_image, rating, comment, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&review.id)
    .bind(&review.product_id)
    .bind(&review.user_id)
    .bind(&review.username)
    .bind(&review.profile_image)
    .bind(review.rating)
    .bind(&review.comment)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(&mut *tx)
    .await?;
    recompute_aggregate(&mut tx, &review.product_id).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Paginated reviews for a product, newest first.
pub async fn list_reviews(
    State(pool): State<SqlitePool>,
    Path(product_id): Path<String>,
    Query(paging): Query<ReviewPage>,
) -> ApiResult<Json<ReviewListResponse>> {
    let page = paging.page.unwrap_or(1).max(1);
    let limit = paging.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let offset = (page - 1) * limit;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = ?")
        .bind(&product_id)
        .fetch_one(&pool)
        .await?;

    let reviews = sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(&product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ReviewListResponse {
        reviews,
        total,
        page,
        limit,
    }))
}

pub async fn update_review(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateReviewRequest>,
) -> ApiResult<Json<Review>> {
    if let Some(rating) = request.rating {
        validate_rating(rating)?;
    }

    let review = sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?"
    ))
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Review not found"))?;

    user.require_owner(&review.user_id)?;

    let now = Utc::now();
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE reviews SET
            rating = COALESCE(?, rating),
            comment = COALESCE(?, comment),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(request.rating)
    .bind(&request.comment)
    .bind(now)
    .bind(&id)
    .execute(&mut *tx)
    .await?;
    recompute_aggregate(&mut tx, &review.product_id).await?;
    tx.commit().await?;

    Ok(Json(Review {
        rating: request.rating.unwrap_or(review.rating),
        comment: request.comment.unwrap_or(review.comment),
        updated_at: now,
        ..review
    }))
}

pub async fn delete_review(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?"
    ))
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Review not found"))?;

    user.require_owner(&review.user_id)?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    recompute_aggregate(&mut tx, &review.product_id).await?;
    tx.commit().await?;

    Ok(Json(json!({ "message": "Review deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
    }
}
