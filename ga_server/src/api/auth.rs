//! Authentication API handlers.
//!
//! Login is two-step: `/login` checks the password and emails a six-character
//! code, `/verify-2fa` trades the code for an access token.
//!
//! ```bash
//! curl -X POST http://localhost:8080/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "pingqueen", "password": "secret1"}'
//!
//! curl -X POST http://localhost:8080/verify-2fa \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "pingqueen", "code": "a1b2c3"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Query, State},
    http::StatusCode,
};
use gang_arcade::auth::{
    AccessTokenClaims, LoginRequest, PasswordResetConfirm, PasswordResetRequest, RegisterRequest,
    VerifyTwoFactorRequest,
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    error::{ApiResult, HttpError, api_error, error_response},
};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub user: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
}

/// Create an account.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid username, email or password, or account exists
/// - `500 Internal Server Error`: Database failure
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<MessageResponse> {
    let user = state
        .auth_manager
        .register(payload)
        .await
        .map_err(api_error)?;

    metrics::registrations_total("email");
    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(MessageResponse::new("User registered successfully"))
}

/// Check the password and email a login code.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password
/// - `403 Forbidden`: Account signs in with Google
/// - `429 Too Many Requests`: More than five attempts a minute for this username
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<MessageResponse> {
    if !state.login_limiter.check(&payload.username) {
        metrics::rate_limit_hits_total("/login");
        log_security_event(
            "rate_limit",
            Some(&payload.username),
            "Too many login attempts",
        );
        return Err(error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts. Try again later.",
        ));
    }

    let username = payload.username.clone();
    match state.auth_manager.login(payload).await {
        Ok(()) => {
            metrics::login_attempts_total("password", true);
            Ok(MessageResponse::new(
                "2FA code sent to email. Please verify your code.",
            ))
        }
        Err(e) => {
            metrics::login_attempts_total("password", false);
            if e.status().is_client_error() {
                log_security_event("failed_login", Some(&username), &e.to_string());
            }
            Err(api_error(e))
        }
    }
}

/// Trade an emailed code for an access token.
///
/// # Errors
///
/// - `400 Bad Request`: Wrong or expired code
/// - `401 Unauthorized`: Unknown user
/// - `429 Too Many Requests`: More than five attempts a minute for this username
pub async fn verify_2fa(
    State(state): State<AppState>,
    Json(payload): Json<VerifyTwoFactorRequest>,
) -> ApiResult<TokenResponse> {
    // Separate key space so a burst of logins does not block verification
    let limiter_key = format!("2fa:{}", payload.username);
    if !state.login_limiter.check(&limiter_key) {
        metrics::rate_limit_hits_total("/verify-2fa");
        log_security_event(
            "rate_limit",
            Some(&payload.username),
            "Too many verification attempts",
        );
        return Err(error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many verification attempts. Try again later.",
        ));
    }

    let username = payload.username.clone();
    match state.auth_manager.verify_2fa(payload).await {
        Ok(token) => {
            metrics::login_attempts_total("two_factor", true);
            Ok(Json(TokenResponse { token }))
        }
        Err(e) => {
            metrics::login_attempts_total("two_factor", false);
            if e.status().is_client_error() {
                log_security_event("failed_2fa", Some(&username), &e.to_string());
            }
            Err(api_error(e))
        }
    }
}

/// Email a password reset link.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> ApiResult<MessageResponse> {
    state
        .auth_manager
        .request_password_reset(payload)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new(
        "Password reset email sent. Please check your inbox.",
    ))
}

/// Set a new password with a reset token.
pub async fn update_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> ApiResult<MessageResponse> {
    state
        .auth_manager
        .update_password(payload)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new("Password successfully updated!"))
}

/// Finish Google sign-in with the authorization code.
///
/// # Errors
///
/// - `400 Bad Request`: No code in the query
/// - `429 Too Many Requests`: Another callback is being processed
/// - `500 Internal Server Error`: Provider exchange failed
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> ApiResult<TokenResponse> {
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Authorization code missing"))?;

    let token = state
        .auth_manager
        .google_login(&code)
        .await
        .map_err(api_error)?;

    metrics::login_attempts_total("google", true);
    Ok(Json(TokenResponse { token }))
}

/// Who the presented token belongs to.
pub async fn info(Extension(claims): Extension<AccessTokenClaims>) -> Json<InfoResponse> {
    Json(InfoResponse {
        user: claims.username,
        id: claims.sub,
    })
}
