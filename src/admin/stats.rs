//! Dashboard statistics: monthly rollups, totals, and seller revenue with
//! the platform fee applied.

use axum::{extract::State, response::Json};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::accounts::Role;
use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;
use crate::orders::PLATFORM_FEE_RATE;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MonthlyCount {
    /// Month bucket as `YYYY-MM`.
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardTotals {
    pub total_clients: i64,
    pub total_sellers: i64,
    pub total_products: i64,
    pub total_orders: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CompletedOrderStats {
    pub completed_orders: i64,
    pub total_revenue: f64,
}

/// Revenue per sold product for one seller, gross and after the platform
/// fee.
#[derive(Debug, Serialize)]
pub struct SoldProductRevenue {
    pub product_id: String,
    pub title: String,
    pub units_sold: i64,
    pub total_price: f64,
    pub total_after_fee: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct SoldProductRow {
    product_id: String,
    title: String,
    units_sold: i64,
    total_price: f64,
}

pub async fn orders_over_time(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<MonthlyCount>>> {
    user.require_role(Role::Admin)?;

    let rows = sqlx::query_as::<_, MonthlyCount>(
        r#"
        SELECT strftime('%Y-%m', order_date) AS month, COUNT(*) AS count
        FROM orders
        GROUP BY month
        ORDER BY month
        "#,
    )
    .fetch_all(&pool)
    .await?;
    Ok(Json(rows))
}

pub async fn users_over_time(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<MonthlyCount>>> {
    user.require_role(Role::Admin)?;

    let rows = sqlx::query_as::<_, MonthlyCount>(
        r#"
        SELECT strftime('%Y-%m', created_at) AS month, COUNT(*) AS count
        FROM accounts
        WHERE role != 'admin'
        GROUP BY month
        ORDER BY month
        "#,
    )
    .fetch_all(&pool)
    .await?;
    Ok(Json(rows))
}

pub async fn totals(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<DashboardTotals>> {
    user.require_role(Role::Admin)?;

    let total_clients: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = 'client'")
            .fetch_one(&pool)
            .await?;
    let total_sellers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = 'seller'")
            .fetch_one(&pool)
            .await?;
    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;
    let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await?;

    Ok(Json(DashboardTotals {
        total_clients,
        total_sellers,
        total_products,
        total_orders,
    }))
}

pub async fn order_status_breakdown(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<StatusCount>>> {
    user.require_role(Role::Admin)?;

    let rows = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM orders GROUP BY status",
    )
    .fetch_all(&pool)
    .await?;
    Ok(Json(rows))
}

pub async fn completed_order_stats(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<CompletedOrderStats>> {
    user.require_role(Role::Admin)?;

    let stats = sqlx::query_as::<_, CompletedOrderStats>(
        r#"
        SELECT COUNT(*) AS completed_orders, COALESCE(SUM(total), 0) AS total_revenue
        FROM orders
        WHERE status = 'completed'
        "#,
    )
    .fetch_one(&pool)
    .await?;
    Ok(Json(stats))
}

/// Per-product revenue for the authenticated seller across completed
/// orders, with the platform fee deducted.
pub async fn sold_products(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<SoldProductRevenue>>> {
    user.require_role(Role::Seller)?;

    let rows = sqlx::query_as::<_, SoldProductRow>(
        r#"
        SELECT oi.product_id AS product_id,
               COALESCE(p.title, '') AS title,
               SUM(oi.quantity) AS units_sold,
               SUM(oi.quantity * oi.price) AS total_price
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        LEFT JOIN products p ON p.id = oi.product_id
        WHERE oi.seller_id = ? AND o.status = 'completed'
        GROUP BY oi.product_id
        ORDER BY total_price DESC
        "#,
    )
    .bind(&user.id)
    .fetch_all(&pool)
    .await?;

    let out = rows
        .into_iter()
        .map(|row| SoldProductRevenue {
            total_after_fee: row.total_price * (1.0 - PLATFORM_FEE_RATE),
            product_id: row.product_id,
            title: row.title,
            units_sold: row.units_sold,
            total_price: row.total_price,
        })
        .collect();
    Ok(Json(out))
}
