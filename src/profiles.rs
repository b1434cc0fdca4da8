//! Profile management: account details and the client shipping address.

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::accounts::{self, Role};
use crate::auth::handlers::AccountResponse;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientAddress {
    pub user_id: String,
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertAddressRequest {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

pub async fn get_profile(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<AccountResponse>> {
    let account = accounts::get_account_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    Ok(Json(account.into()))
}

pub async fn update_profile(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<AccountResponse>> {
    if let Some(email) = request.email.as_deref() {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::validation("Email cannot be empty"));
        }
        // Another account may already hold the new address.
        if let Some(existing) = accounts::get_account_by_email(&pool, email).await? {
            if existing.id != user.id {
                return Err(ApiError::conflict("Email already exists"));
            }
        }
    }

    let result = sqlx::query(
        r#"
        UPDATE accounts SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            email = COALESCE(?, email),
            profile_image = COALESCE(?, profile_image),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(request.first_name.as_deref().map(str::trim))
    .bind(request.last_name.as_deref().map(str::trim))
    .bind(request.email.as_deref().map(str::trim))
    .bind(&request.profile_image)
    .bind(Utc::now())
    .bind(&user.id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Account not found"));
    }

    let account = accounts::get_account_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    Ok(Json(account.into()))
}

pub async fn get_address(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ClientAddress>> {
    user.require_role(Role::Client)?;

    let address = sqlx::query_as::<_, ClientAddress>(
        "SELECT user_id, full_name, phone, street, city, postal_code, country, updated_at \
         FROM client_addresses WHERE user_id = ?",
    )
    .bind(&user.id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Address not found"))?;
    Ok(Json(address))
}

/// One address per client, replaced wholesale on every save.
pub async fn upsert_address(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<UpsertAddressRequest>,
) -> ApiResult<Json<ClientAddress>> {
    user.require_role(Role::Client)?;

    if request.full_name.trim().is_empty()
        || request.phone.trim().is_empty()
        || request.street.trim().is_empty()
        || request.city.trim().is_empty()
        || request.postal_code.trim().is_empty()
        || request.country.trim().is_empty()
    {
        return Err(ApiError::validation("All address fields are required"));
    }

    let address = ClientAddress {
        user_id: user.id.clone(),
        full_name: request.full_name.trim().to_string(),
        phone: request.phone.trim().to_string(),
        street: request.street.trim().to_string(),
        city: request.city.trim().to_string(),
        postal_code: request.postal_code.trim().to_string(),
        country: request.country.trim().to_string(),
        updated_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO client_addresses (user_id, full_name, phone, street, city, postal_code, country, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = excluded.full_name,
            phone = excluded.phone,
            street = excluded.street,
            city = excluded.city,
            postal_code = excluded.postal_code,
            country = excluded.country,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&address.user_id)
    .bind(&address.full_name)
    .bind(&address.phone)
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.postal_code)
    .bind(&address.country)
    .bind(address.updated_at)
    .execute(&pool)
    .await?;

    Ok(Json(address))
}
