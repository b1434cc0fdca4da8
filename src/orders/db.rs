//! Order store operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Canceled,
}

impl OrderStatus {
    /// Completed and canceled orders never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub total: f64,
    pub payment_method: String,
    pub account_holder_name: String,
    pub account_number: String,
    pub transaction_id: String,
    /// Opaque reference to uploaded payment evidence.
    pub payment_proof: Option<String>,
    pub status: OrderStatus,
    /// Serialized shipping address snapshot, stored as JSON text.
    pub shipping_address: Option<String>,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Line items are a snapshot taken at order time, not live-linked to the
/// product rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub seller_id: String,
    pub quantity: i64,
    pub price: f64,
    pub image: Option<String>,
}

/// An order with its line items, the shape every listing returns.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

const ORDER_COLUMNS: &str = "id, user_id, total, payment_method, account_holder_name, \
     account_number, transaction_id, payment_proof, status, shipping_address, order_date, \
     delivery_date, created_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, seller_id, quantity, price, image";

pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders
            (id, user_id, total, payment_method, account_holder_name, account_number,
             transaction_id, payment_proof, status, shipping_address, order_date,
             delivery_date, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(order.total)
    .bind(&order.payment_method)
    .bind(&order.account_holder_name)
    .bind(&order.account_number)
    .bind(&order.transaction_id)
    .bind(&order.payment_proof)
    .bind(order.status)
    .bind(&order.shipping_address)
    .bind(order.order_date)
    .bind(order.delivery_date)
    .bind(order.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_order_item(
    conn: &mut SqliteConnection,
    item: &OrderItem,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, product_id, seller_id, quantity, price, image)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.seller_id)
    .bind(item.quantity)
    .bind(item.price)
    .bind(&item.image)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get_order(pool: &SqlitePool, id: &str) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Same as [`get_order`] but usable inside a transaction.
pub async fn get_order_for_update(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list_order_items(
    pool: &SqlitePool,
    order_id: &str,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await
}

pub async fn list_order_items_tx(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?"
    ))
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub async fn list_orders_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY order_date DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Orders containing at least one of the seller's items.
pub async fn list_orders_by_seller(
    pool: &SqlitePool,
    seller_id: &str,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        r#"
        SELECT DISTINCT o.id, o.user_id, o.total, o.payment_method, o.account_holder_name,
               o.account_number, o.transaction_id, o.payment_proof, o.status,
               o.shipping_address, o.order_date, o.delivery_date, o.created_at
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id
        WHERE oi.seller_id = ?
        ORDER BY o.order_date DESC
        "#,
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await
}

/// Items belonging to a specific seller within one order.
pub async fn list_seller_items(
    pool: &SqlitePool,
    order_id: &str,
    seller_id: &str,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? AND seller_id = ?"
    ))
    .bind(order_id)
    .bind(seller_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all_orders(pool: &SqlitePool) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn update_order_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: OrderStatus,
    delivery_date: Option<DateTime<Utc>>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = ?, delivery_date = ? WHERE id = ?")
        .bind(status)
        .bind(delivery_date)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Items cascade via the schema's ON DELETE.
pub async fn delete_order(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }
}
