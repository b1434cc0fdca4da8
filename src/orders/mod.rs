//! Order lifecycle: placement, status transitions, and listings.
//!
//! Placement and cancellation share a transaction with the inventory
//! adjusters so stock and order state always move together.

pub mod db;
pub mod handlers;

pub use db::{Order, OrderItem, OrderStatus};

/// Share of sold-product revenue retained by the platform.
pub const PLATFORM_FEE_RATE: f64 = 0.05;

/// Days between completion and the promised delivery date.
pub const DELIVERY_LEAD_DAYS: i64 = 3;
