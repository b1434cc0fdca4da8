//! Bearer-token authentication middleware.
//!
//! Extracts and verifies the JWT from the Authorization header and attaches
//! the caller's identity to request extensions. Handlers receive it through
//! the `AuthUser` extractor and apply role checks themselves.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::auth::accounts::Role;
use crate::auth::sessions::verify_token;
use crate::error::ApiError;
use crate::server::state::AppState;

/// Authenticated caller identity extracted from the bearer token.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Reject unless the caller owns the given resource id.
    pub fn require_owner(&self, owner_id: &str) -> Result<(), ApiError> {
        if self.id != owner_id {
            return Err(ApiError::forbidden("Not authorized for this resource"));
        }
        Ok(())
    }

    /// Reject unless the caller holds the given role.
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role != role {
            return Err(ApiError::forbidden(format!(
                "This action requires the {role} role"
            )));
        }
        Ok(())
    }
}

/// Authentication middleware for protected route groups.
///
/// Returns 401 when the token is missing or fails verification.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            StatusCode::UNAUTHORIZED
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Invalid Authorization header format");
        StatusCode::UNAUTHORIZED
    })?;

    let claims = verify_token(token).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated caller.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                ApiError::unauthorized("Authentication required")
            })?;

        Ok(AuthUser(user))
    }
}
