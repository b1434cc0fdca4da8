//! Top-level router.

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use crate::middleware::auth::auth_middleware;
use crate::routes::api_routes::{protected_routes, public_routes};
use crate::server::state::AppState;

/// Assemble the full application router: public routes, bearer-protected
/// routes, permissive CORS, and a JSON 404 fallback.
pub fn create_router(state: AppState) -> Router {
    let protected = protected_routes().route_layer(middleware::from_fn(auth_middleware));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .layer(CorsLayer::permissive())
        .fallback(|| async {
            (
                axum::http::StatusCode::NOT_FOUND,
                axum::Json(serde_json::json!({ "error": "Not found" })),
            )
        })
        .with_state(state)
}
