//! Password reset and change.
//!
//! Reset flow: `forgot_password` issues a 6-digit OTP with a 5-minute
//! expiry (one live code per email, newer codes replace older ones) and
//! mails it; `verify_otp` burns the code and hands back a generated
//! replacement password. `change_password` is the authenticated path.

use axum::{extract::State, response::Json};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::auth::accounts;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

/// OTP lifetime. Config candidate.
const OTP_TTL_MINUTES: i64 = 5;

const GENERATED_PASSWORD_LEN: usize = 12;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, sqlx::FromRow)]
struct OtpRow {
    code: String,
    expires_at: DateTime<Utc>,
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Issue an OTP for password reset.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    let account = accounts::get_account_by_email(&state.pool, email)
        .await?
        .ok_or_else(|| ApiError::validation("Email not found"))?;

    let otp = generate_otp();
    let now = Utc::now();
    let expires_at = now + Duration::minutes(OTP_TTL_MINUTES);

    // One live code per email: replace any previous OTP.
    sqlx::query(
        r#"
        INSERT INTO otps (email, code, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (email) DO UPDATE SET code = excluded.code,
            expires_at = excluded.expires_at, created_at = excluded.created_at
        "#,
    )
    .bind(&account.email)
    .bind(&otp)
    .bind(expires_at)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let body = format!(
        "Your OTP is {otp}. It expires in {OTP_TTL_MINUTES} minutes."
    );
    match &state.mailer {
        Some(mailer) => {
            mailer
                .send(&account.email, "Your OTP for Password Reset", &body)
                .await?
        }
        None => tracing::info!("SMTP not configured; OTP for {}: {otp}", account.email),
    }

    Ok(Json(json!({ "message": "OTP sent successfully" })))
}

/// Verify an OTP and reset the password to a generated value.
pub async fn verify_otp(
    State(pool): State<SqlitePool>,
    Json(request): Json<VerifyOtpRequest>,
) -> ApiResult<Json<Value>> {
    // Codes are stored under the trimmed account email; match the issue path.
    let email = request.email.trim();
    if email.is_empty() || request.otp.trim().is_empty() {
        return Err(ApiError::validation("Email and OTP are required"));
    }

    let row = sqlx::query_as::<_, OtpRow>("SELECT code, expires_at FROM otps WHERE email = ?")
        .bind(email)
        .fetch_optional(&pool)
        .await?
        .filter(|row| row.code == request.otp)
        .ok_or_else(|| ApiError::validation("Invalid OTP"))?;

    if row.expires_at < Utc::now() {
        sqlx::query("DELETE FROM otps WHERE email = ?")
            .bind(email)
            .execute(&pool)
            .await?;
        return Err(ApiError::validation("OTP has expired"));
    }

    let new_password = generate_password();
    let password_hash = bcrypt::hash(&new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))?;

    let updated = accounts::update_password(&pool, email, &password_hash).await?;
    if updated == 0 {
        return Err(ApiError::not_found("Account not found"));
    }

    sqlx::query("DELETE FROM otps WHERE email = ?")
        .bind(email)
        .execute(&pool)
        .await?;

    tracing::info!("Password reset via OTP for {email}");

    Ok(Json(json!({ "new_password": new_password })))
}

/// Change the authenticated caller's password.
pub async fn change_password(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    if request.new_password.is_empty() {
        return Err(ApiError::validation("New password is required"));
    }

    let account = accounts::get_account_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    let valid = bcrypt::verify(&request.current_password, &account.password_hash)
        .map_err(|e| ApiError::internal(format!("failed to verify password: {e}")))?;
    if !valid {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let password_hash = bcrypt::hash(&request.new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))?;
    accounts::update_password(&pool, &account.email, &password_hash).await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}
