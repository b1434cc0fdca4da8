//! Category catalog: public listing, admin CRUD.

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
pub struct Category {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

pub async fn list_categories(State(pool): State<SqlitePool>) -> ApiResult<Json<Vec<Category>>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, image_url, created_at FROM categories ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, image_url, created_at FROM categories WHERE id = ?",
    )
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(Json(category))
}

pub async fn create_category(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    user.require_role(Role::Admin)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Category name is required"));
    }

    let category = Category {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        image_url: request.image_url,
        created_at: Utc::now(),
    };

    sqlx::query("INSERT INTO categories (id, name, image_url, created_at) VALUES (?, ?, ?, ?)")
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.image_url)
        .bind(category.created_at)
        .execute(&pool)
        .await?;

    tracing::info!("Category created: {}", category.name);

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    user.require_role(Role::Admin)?;

    let result = sqlx::query(
        r#"
        UPDATE categories SET
            name = COALESCE(?, name),
            image_url = COALESCE(?, image_url)
        WHERE id = ?
        "#,
    )
    .bind(request.name.as_deref().map(str::trim))
    .bind(&request.image_url)
    .bind(&id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Category not found"));
    }

    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, image_url, created_at FROM categories WHERE id = ?",
    )
    .bind(&id)
    .fetch_one(&pool)
    .await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_role(Role::Admin)?;

    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(&id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Category not found"));
    }

    Ok(Json(json!({ "message": "Category deleted successfully" })))
}
