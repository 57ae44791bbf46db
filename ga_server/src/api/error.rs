//! Mapping of domain errors to HTTP responses.
//!
//! Every error body is `{"error": "<message>"}`. Server-side failures are
//! logged in full and answered with the sanitized message only.

use axum::{Json, http::StatusCode};
use gang_arcade::{AuthError, FriendshipError, GameError, ProfileError, oauth::OAuthError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Handler result carrying a JSON body
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build an error response with an explicit status
pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// A domain error that knows its HTTP status
pub trait HttpError: Display {
    fn status(&self) -> StatusCode;
    fn client_message(&self) -> String;
}

/// Convert a domain error, logging it when it is the server's fault
pub fn api_error<E: HttpError>(err: E) -> ApiError {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, status = %status, "Request rejected");
    }
    error_response(status, err.client_message())
}

impl HttpError for AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::UserExists
            | AuthError::InvalidUsername
            | AuthError::InvalidEmail
            | AuthError::WeakPassword
            | AuthError::EmailNotFound
            | AuthError::InvalidTwoFactorCode
            | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::UserNotFound | AuthError::JwtError(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::UseGoogleSignIn => StatusCode::FORBIDDEN,
            AuthError::DuplicateRequest => StatusCode::TOO_MANY_REQUESTS,
            AuthError::OAuth(OAuthError::Rejected(_)) => StatusCode::UNAUTHORIZED,
            AuthError::Database(_)
            | AuthError::HashingFailed
            | AuthError::OAuth(_)
            | AuthError::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        AuthError::client_message(self)
    }
}

impl HttpError for FriendshipError {
    fn status(&self) -> StatusCode {
        match self {
            FriendshipError::SelfRequest | FriendshipError::AlreadyFriends => {
                StatusCode::BAD_REQUEST
            }
            FriendshipError::NotReceiver | FriendshipError::NotParticipant => StatusCode::FORBIDDEN,
            FriendshipError::NotFound => StatusCode::NOT_FOUND,
            FriendshipError::Database(_) | FriendshipError::UnknownStatus(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        FriendshipError::client_message(self)
    }
}

impl HttpError for ProfileError {
    fn status(&self) -> StatusCode {
        match self {
            ProfileError::UserNotFound | ProfileError::NoProfiles => StatusCode::NOT_FOUND,
            ProfileError::Forbidden => StatusCode::FORBIDDEN,
            ProfileError::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProfileError::InvalidUsername
            | ProfileError::FieldNotAllowed
            | ProfileError::InvalidName
            | ProfileError::InvalidDate
            | ProfileError::InvalidValue { .. }
            | ProfileError::NoFile
            | ProfileError::InvalidFileType => StatusCode::BAD_REQUEST,
            ProfileError::Database(_) | ProfileError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        ProfileError::client_message(self)
    }
}

impl HttpError for GameError {
    fn status(&self) -> StatusCode {
        match self {
            GameError::MissingFields
            | GameError::InvalidUsername
            | GameError::InvalidEmail
            | GameError::InvalidGameName(_)
            | GameError::InvalidRounds(_)
            | GameError::UnknownUser
            | GameError::Tournament(_) => StatusCode::BAD_REQUEST,
            GameError::HostNotFound => StatusCode::UNAUTHORIZED,
            GameError::Forbidden => StatusCode::FORBIDDEN,
            GameError::UserNotFound | GameError::TournamentNotFound => StatusCode::NOT_FOUND,
            GameError::Database(_) | GameError::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        GameError::client_message(self)
    }
}
