//! Authentication middleware for protected endpoints.
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! decoded [`AccessTokenClaims`] into request extensions for the handlers.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use gang_arcade::auth::AccessTokenClaims;
//!
//! async fn protected_handler(Extension(claims): Extension<AccessTokenClaims>) -> String {
//!     format!("Authenticated as {}", claims.username)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::{
    AppState,
    error::{ApiError, error_response},
};

/// Reject the request with 401 unless it carries a valid access token.
///
/// - **Success**: claims are inserted into extensions, next handler runs
/// - **Missing or malformed header**: `401 {"error": "No token provided"}`
/// - **Invalid or expired token**: `401 {"error": "Invalid token"}`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "No token provided"))?;

    match state.auth_manager.verify_access_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!("Rejected access token: {e}");
            Err(error_response(StatusCode::UNAUTHORIZED, "Invalid token"))
        }
    }
}
