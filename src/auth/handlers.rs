//! Signup, login, and current-account handlers.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::accounts::{self, Role};
use crate::auth::sessions::create_token;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by signup and login; carries the bearer token alongside the
/// caller's identity so clients can authenticate immediately.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub account: AccountResponse,
}

/// Account information safe to return to clients (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

impl From<accounts::Account> for AccountResponse {
    fn from(account: accounts::Account) -> Self {
        AccountResponse {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            role: account.role,
            profile_image: account.profile_image,
        }
    }
}

/// Register a new client or seller account.
///
/// Admin accounts are provisioned out of band, never self-registered.
pub async fn signup(
    State(pool): State<SqlitePool>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if request.first_name.trim().is_empty()
        || request.last_name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(ApiError::validation(
            "First name, last name, email, password, and role are required",
        ));
    }

    if request.role == Role::Admin {
        return Err(ApiError::forbidden("Admin accounts cannot self-register"));
    }

    if accounts::get_account_by_email(&pool, &request.email)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("Email already exists"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))?;

    let account = accounts::create_account(
        &pool,
        request.first_name.trim(),
        request.last_name.trim(),
        request.email.trim(),
        &password_hash,
        request.role,
    )
    .await?;

    tracing::info!("New {} account registered: {}", account.role, account.email);

    let token = create_token(&account.id, &account.email, account.role)
        .map_err(|e| ApiError::internal(format!("failed to create token: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            account: account.into(),
        }),
    ))
}

/// Authenticate any role with a single account lookup.
pub async fn login(
    State(pool): State<SqlitePool>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let account = accounts::get_account_by_email(&pool, &request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let valid = bcrypt::verify(&request.password, &account.password_hash)
        .map_err(|e| ApiError::internal(format!("failed to verify password: {e}")))?;
    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = create_token(&account.id, &account.email, account.role)
        .map_err(|e| ApiError::internal(format!("failed to create token: {e}")))?;

    tracing::info!("Login: {} ({})", account.email, account.role);

    Ok(Json(AuthResponse {
        token,
        account: account.into(),
    }))
}

/// Return the authenticated caller's account.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<AccountResponse>> {
    let account = accounts::get_account_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    Ok(Json(account.into()))
}
