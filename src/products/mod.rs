//! Product catalog: models, store operations, inventory adjustment, and
//! route handlers.

pub mod db;
pub mod handlers;
pub mod inventory;

pub use db::{Product, ProductStatus};
pub use inventory::QuantityItem;
