//! Admin handlers: listings, account removal, and bank account records.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::auth::accounts::{self, Role};
use crate::auth::handlers::AccountResponse;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::products::db::{self as products_db, Product};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BankAccount {
    pub id: String,
    pub bank: String,
    pub account_holder_name: String,
    pub account_number: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBankAccountRequest {
    pub bank: String,
    pub account_holder_name: String,
    pub account_number: String,
}

#[derive(Debug, Deserialize)]
pub struct BankFilter {
    pub bank: Option<String>,
}

pub async fn list_clients(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    user.require_role(Role::Admin)?;
    let accounts = accounts::list_accounts_by_role(&pool, Role::Client).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

pub async fn list_sellers(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    user.require_role(Role::Admin)?;
    let accounts = accounts::list_accounts_by_role(&pool, Role::Seller).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

pub async fn list_all_products(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Product>>> {
    user.require_role(Role::Admin)?;
    let products = products_db::list_products(&pool, None, None).await?;
    Ok(Json(products))
}

pub async fn delete_client(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_role(Role::Admin)?;
    let deleted = accounts::delete_account(&pool, &id, Role::Client).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Client not found"));
    }
    Ok(Json(json!({ "message": "Client deleted successfully" })))
}

pub async fn delete_seller(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_role(Role::Admin)?;
    let deleted = accounts::delete_account(&pool, &id, Role::Seller).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Seller not found"));
    }
    Ok(Json(json!({ "message": "Seller deleted successfully" })))
}

pub async fn delete_product(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_role(Role::Admin)?;
    let deleted = products_db::delete_product_unchecked(&pool, &id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Product not found"));
    }
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// Payment-destination records surfaced at checkout, filterable by bank.
pub async fn list_bank_accounts(
    State(pool): State<SqlitePool>,
    Query(filter): Query<BankFilter>,
) -> ApiResult<Json<Vec<BankAccount>>> {
    let accounts = sqlx::query_as::<_, BankAccount>(
        r#"
        SELECT id, bank, account_holder_name, account_number
        FROM bank_accounts
        WHERE (? IS NULL OR bank = ?)
        ORDER BY bank
        "#,
    )
    .bind(&filter.bank)
    .bind(&filter.bank)
    .fetch_all(&pool)
    .await?;
    Ok(Json(accounts))
}

pub async fn create_bank_account(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateBankAccountRequest>,
) -> ApiResult<(StatusCode, Json<BankAccount>)> {
    user.require_role(Role::Admin)?;

    if request.bank.trim().is_empty()
        || request.account_holder_name.trim().is_empty()
        || request.account_number.trim().is_empty()
    {
        return Err(ApiError::validation(
            "Bank, account holder name, and account number are required",
        ));
    }

    let account = BankAccount {
        id: uuid::Uuid::new_v4().to_string(),
        bank: request.bank.trim().to_string(),
        account_holder_name: request.account_holder_name.trim().to_string(),
        account_number: request.account_number.trim().to_string(),
    };

    sqlx::query(
        "INSERT INTO bank_accounts (id, bank, account_holder_name, account_number) VALUES (?, ?, ?, ?)",
    )
    .bind(&account.id)
    .bind(&account.bank)
    .bind(&account.account_holder_name)
    .bind(&account.account_number)
    .execute(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(account)))
}
