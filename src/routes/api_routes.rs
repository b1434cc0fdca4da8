//! API route groups.
//!
//! `public_routes` needs no bearer token; `protected_routes` is wrapped
//! with the authentication middleware by the router.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::admin;
use crate::auth;
use crate::categories;
use crate::chat;
use crate::discounts;
use crate::orders;
use crate::products;
use crate::profiles;
use crate::reviews;
use crate::server::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Authentication
        .route("/api/auth/signup", post(auth::handlers::signup))
        .route("/api/auth/login", post(auth::handlers::login))
        .route(
            "/api/auth/forgot-password",
            post(auth::password::forgot_password),
        )
        .route("/api/auth/verify-otp", post(auth::password::verify_otp))
        // Catalog
        .route("/api/products", get(products::handlers::list_products))
        .route("/api/products/{id}", get(products::handlers::get_product))
        .route("/api/products/{id}/reviews", get(reviews::list_reviews))
        .route("/api/categories", get(categories::list_categories))
        .route("/api/categories/{id}", get(categories::get_category))
        // Payment destinations shown at checkout
        .route("/api/bank-accounts", get(admin::handlers::list_bank_accounts))
        // Internal batch inventory adjustment
        .route(
            "/api/products/decrease-quantities",
            put(products::handlers::decrease_quantities),
        )
        .route(
            "/api/products/increase-quantities",
            put(products::handlers::increase_quantities),
        )
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        // Account
        .route("/api/auth/me", get(auth::handlers::get_me))
        .route(
            "/api/auth/change-password",
            post(auth::password::change_password),
        )
        .route(
            "/api/profile",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route(
            "/api/profile/address",
            get(profiles::get_address).put(profiles::upsert_address),
        )
        // Seller catalog management
        .route(
            "/api/seller/products",
            get(products::handlers::list_my_products).post(products::handlers::create_product),
        )
        .route(
            "/api/seller/products/{id}",
            put(products::handlers::update_product).delete(products::handlers::delete_product),
        )
        .route(
            "/api/seller/orders/{seller_id}",
            get(orders::handlers::list_seller_orders),
        )
        .route("/api/seller/chats", get(chat::handlers::list_seller_chats))
        .route("/api/seller/sold-products", get(admin::stats::sold_products))
        // Client orders and chats
        .route(
            "/api/client/orders",
            get(orders::handlers::list_my_orders).post(orders::handlers::create_order),
        )
        .route("/api/client/chats", get(chat::handlers::list_client_chats))
        .route("/api/orders/{id}", get(orders::handlers::get_order))
        // Chat
        .route("/api/chat/initiate", post(chat::handlers::initiate_chat))
        .route("/api/chat/{chat_id}/events", get(chat::handlers::chat_events))
        .route(
            "/api/chat/{chat_id}/messages",
            get(chat::handlers::list_messages).post(chat::handlers::send_message),
        )
        .route("/api/chat/{chat_id}/seen", post(chat::handlers::mark_seen))
        .route("/api/chat/{chat_id}/typing", post(chat::handlers::typing))
        .route(
            "/api/chat/{chat_id}",
            get(chat::handlers::get_chat).delete(chat::handlers::delete_chat),
        )
        // Discounts
        .route("/api/discounts", post(discounts::upsert_discount))
        .route("/api/discounts/{id}", delete(discounts::delete_discount))
        .route(
            "/api/client/discounts/{product_id}",
            get(discounts::get_my_discount),
        )
        .route(
            "/api/seller/discounts/{product_id}/{user_id}",
            get(discounts::get_discount_for_buyer),
        )
        // Reviews
        .route("/api/reviews", post(reviews::create_review))
        .route(
            "/api/reviews/{id}",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        // Admin
        .route("/api/admin/clients", get(admin::handlers::list_clients))
        .route(
            "/api/admin/clients/{id}",
            delete(admin::handlers::delete_client),
        )
        .route("/api/admin/sellers", get(admin::handlers::list_sellers))
        .route(
            "/api/admin/sellers/{id}",
            delete(admin::handlers::delete_seller),
        )
        .route("/api/admin/products", get(admin::handlers::list_all_products))
        .route(
            "/api/admin/products/{id}",
            delete(admin::handlers::delete_product),
        )
        .route("/api/admin/orders", get(orders::handlers::list_all_orders))
        .route(
            "/api/admin/orders/{id}/status",
            put(orders::handlers::update_order_status),
        )
        .route(
            "/api/admin/orders/{id}",
            delete(orders::handlers::delete_order),
        )
        .route(
            "/api/admin/categories",
            post(categories::create_category),
        )
        .route(
            "/api/admin/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/api/admin/stats/orders-over-time",
            get(admin::stats::orders_over_time),
        )
        .route(
            "/api/admin/stats/users-over-time",
            get(admin::stats::users_over_time),
        )
        .route("/api/admin/stats/totals", get(admin::stats::totals))
        .route(
            "/api/admin/stats/order-status",
            get(admin::stats::order_status_breakdown),
        )
        .route(
            "/api/admin/stats/completed-orders",
            get(admin::stats::completed_order_stats),
        )
        .route(
            "/api/admin/bank-accounts",
            post(admin::handlers::create_bank_account),
        )
}
