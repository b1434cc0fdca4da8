//! Bazaar — a multi-role marketplace backend.
//!
//! REST API for clients, sellers and admins (auth, catalog, orders,
//! discounts, reviews, profiles) plus a realtime chat relay built on
//! per-chat broadcast channels and Server-Sent Events.
//!
//! The two load-bearing pieces are the order lifecycle (order creation and
//! cancellation adjust product stock inside a single store transaction) and
//! the chat relay (persist-then-broadcast message delivery). Everything
//! else is thin request/response handlers over the store.

pub mod server;
pub mod routes;
pub mod error;
pub mod middleware;
pub mod auth;
pub mod mail;
pub mod products;
pub mod categories;
pub mod orders;
pub mod chat;
pub mod discounts;
pub mod reviews;
pub mod profiles;
pub mod admin;

pub use error::{ApiError, ApiResult};
pub use server::state::AppState;
