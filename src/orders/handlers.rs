//! Order route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::auth::accounts::Role;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::orders::db::{self, Order, OrderItem, OrderStatus, OrderWithItems};
use crate::orders::DELIVERY_LEAD_DAYS;
use crate::products::inventory::{self, QuantityItem};

/// One line of an order request: a snapshot of the product at checkout.
#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub seller_id: String,
    pub quantity: i64,
    pub price: f64,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderItemRequest>,
    pub total: f64,
    pub payment_method: String,
    pub account_holder_name: String,
    pub account_number: String,
    pub transaction_id: String,
    pub payment_proof: Option<String>,
    pub shipping_address: Option<Value>,
    pub order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Seller view of an order: only that seller's line items are included.
#[derive(Debug, Serialize)]
pub struct SellerOrderView {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

/// Place an order.
///
/// Order insert, line items, and the stock decrement run in one
/// transaction. If any product is short the whole order rolls back and
/// never becomes visible.
pub async fn create_order(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    user.require_role(Role::Client)?;
    user.require_owner(&request.user_id)?;

    if request.items.is_empty() {
        return Err(ApiError::validation("Order must contain at least one item"));
    }
    if request.payment_method.trim().is_empty()
        || request.account_holder_name.trim().is_empty()
        || request.account_number.trim().is_empty()
        || request.transaction_id.trim().is_empty()
    {
        return Err(ApiError::validation("Payment details are required"));
    }
    let order_date = request
        .order_date
        .ok_or_else(|| ApiError::validation("Order date is required"))?;

    let shipping_address = match &request.shipping_address {
        Some(value) => Some(
            serde_json::to_string(value)
                .map_err(|e| ApiError::internal(format!("failed to serialize address: {e}")))?,
        ),
        None => None,
    };

    let order_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    let items: Vec<OrderItem> = request
        .items
        .iter()
        .map(|line| OrderItem {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            product_id: line.product_id.clone(),
            seller_id: line.seller_id.clone(),
            quantity: line.quantity,
            price: line.price,
            image: line.image.clone(),
        })
        .collect();

    let adjustments: Vec<QuantityItem> = request
        .items
        .iter()
        .map(|line| QuantityItem {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        })
        .collect();

    let order = Order {
        id: order_id,
        user_id: user.id.clone(),
        total: request.total,
        payment_method: request.payment_method,
        account_holder_name: request.account_holder_name,
        account_number: request.account_number,
        transaction_id: request.transaction_id,
        payment_proof: request.payment_proof,
        status: OrderStatus::Pending,
        shipping_address,
        order_date,
        delivery_date: None,
        created_at: now,
    };

    let mut tx = pool.begin().await?;

    inventory::decrease_quantities(&mut *tx, &adjustments).await?;
    db::insert_order(&mut tx, &order).await?;
    for item in &items {
        db::insert_order_item(&mut tx, item).await?;
    }

    tx.commit().await?;

    tracing::info!(
        "Order {} placed by {} ({} items, total {:.2})",
        order.id,
        user.id,
        items.len(),
        order.total
    );

    Ok((StatusCode::CREATED, Json(OrderWithItems { order, items })))
}

/// The authenticated client's orders, newest first.
pub async fn list_my_orders(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<OrderWithItems>>> {
    user.require_role(Role::Client)?;

    let orders = db::list_orders_by_user(&pool, &user.id).await?;
    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        let items = db::list_order_items(&pool, &order.id).await?;
        out.push(OrderWithItems { order, items });
    }
    Ok(Json(out))
}

/// Orders containing the seller's products, pruned to their own items.
pub async fn list_seller_orders(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(seller_id): Path<String>,
) -> ApiResult<Json<Vec<SellerOrderView>>> {
    user.require_role(Role::Seller)?;
    user.require_owner(&seller_id)?;

    let orders = db::list_orders_by_seller(&pool, &seller_id).await?;
    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        let items = db::list_seller_items(&pool, &order.id, &seller_id).await?;
        out.push(SellerOrderView {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            shipping_address: order.shipping_address,
            created_at: order.order_date,
            delivery_date: order.delivery_date,
            items,
        });
    }
    Ok(Json(out))
}

pub async fn get_order(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    let order = db::get_order(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if user.role != Role::Admin {
        user.require_owner(&order.user_id)?;
    }

    let items = db::list_order_items(&pool, &order.id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

pub async fn list_all_orders(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<OrderWithItems>>> {
    user.require_role(Role::Admin)?;

    let orders = db::list_all_orders(&pool).await?;
    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        let items = db::list_order_items(&pool, &order.id).await?;
        out.push(OrderWithItems { order, items });
    }
    Ok(Json(out))
}

/// Admin status transition.
///
/// Pending orders can complete or cancel; terminal orders only accept a
/// same-state no-op. Completion stamps the delivery date from the order
/// date, so replays always produce the same value. Cancellation restores
/// stock in the same transaction as the status flip.
pub async fn update_order_status(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    user.require_role(Role::Admin)?;

    let mut tx = pool.begin().await?;

    let order = db::get_order_for_update(&mut tx, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if request.status == order.status {
        return Ok(Json(order));
    }

    if order.status.is_terminal() {
        return Err(ApiError::conflict(format!(
            "Order is already {}",
            order.status
        )));
    }
    if request.status == OrderStatus::Pending {
        return Err(ApiError::validation("Orders cannot return to pending"));
    }

    let delivery_date = match request.status {
        OrderStatus::Completed => order
            .delivery_date
            .or_else(|| Some(order.order_date + Duration::days(DELIVERY_LEAD_DAYS))),
        _ => order.delivery_date,
    };

    if request.status == OrderStatus::Canceled {
        let items = db::list_order_items_tx(&mut tx, &order.id).await?;
        let restore: Vec<QuantityItem> = items
            .iter()
            .map(|item| QuantityItem {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect();
        inventory::increase_quantities(&mut *tx, &restore).await?;
    }

    db::update_order_status(&mut tx, &order.id, request.status, delivery_date).await?;
    tx.commit().await?;

    tracing::info!("Order {} -> {}", order.id, request.status);

    Ok(Json(Order {
        status: request.status,
        delivery_date,
        ..order
    }))
}

/// Remove a finished order. Pending orders cannot be deleted.
pub async fn delete_order(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require_role(Role::Admin)?;

    let order = db::get_order(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if !order.status.is_terminal() {
        return Err(ApiError::conflict(
            "Only completed or canceled orders can be deleted",
        ));
    }

    db::delete_order(&pool, &id).await?;

    Ok(Json(json!({ "message": "Order deleted successfully" })))
}
