//! Inventory adjustment.
//!
//! Decrements are conditional at the store level: the quantity guard lives
//! in the UPDATE's WHERE clause, so two concurrent buyers can never drive
//! stock below zero. Both adjusters take a bare connection so order
//! creation and cancellation can run them inside their own transactions.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::error::{ApiError, ApiResult};

/// One line of a batch inventory adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityItem {
    pub product_id: String,
    pub quantity: i64,
}

fn validate_items(items: &[QuantityItem]) -> ApiResult<()> {
    if items.is_empty() {
        return Err(ApiError::validation("At least one item is required"));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(ApiError::validation(format!(
                "Quantity must be positive for product {}",
                item.product_id
            )));
        }
    }
    Ok(())
}

/// Decrement stock for every item, failing the whole batch if any product
/// is missing or short. The caller owns the transaction; an error here
/// must roll the entire batch back.
pub async fn decrease_quantities(
    conn: &mut SqliteConnection,
    items: &[QuantityItem],
) -> ApiResult<()> {
    validate_items(items)?;

    for item in items {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - ?, updated_at = ?
            WHERE id = ? AND quantity >= ?
            "#,
        )
        .bind(item.quantity)
        .bind(Utc::now())
        .bind(&item.product_id)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            // Zero rows means either no such product or not enough stock.
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
                    .bind(&item.product_id)
                    .fetch_one(&mut *conn)
                    .await?;
            if exists == 0 {
                return Err(ApiError::not_found(format!(
                    "Product not found: {}",
                    item.product_id
                )));
            }
            return Err(ApiError::conflict(format!(
                "Insufficient quantity for product {}",
                item.product_id
            )));
        }
    }

    Ok(())
}

/// Restore stock for every item. Unconditional; used when an order is
/// canceled or an adjustment is reversed.
pub async fn increase_quantities(
    conn: &mut SqliteConnection,
    items: &[QuantityItem],
) -> ApiResult<()> {
    validate_items(items)?;

    for item in items {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(item.quantity)
        .bind(Utc::now())
        .bind(&item.product_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "Product not found: {}",
                item.product_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_rejected() {
        let err = validate_items(&[]).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let items = vec![QuantityItem {
            product_id: "p1".into(),
            quantity: 0,
        }];
        assert!(validate_items(&items).is_err());

        let items = vec![QuantityItem {
            product_id: "p1".into(),
            quantity: -3,
        }];
        assert!(validate_items(&items).is_err());
    }

    #[test]
    fn positive_quantities_pass_validation() {
        let items = vec![
            QuantityItem {
                product_id: "p1".into(),
                quantity: 1,
            },
            QuantityItem {
                product_id: "p2".into(),
                quantity: 40,
            },
        ];
        assert!(validate_items(&items).is_ok());
    }
}
