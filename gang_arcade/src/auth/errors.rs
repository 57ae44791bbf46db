//! Authentication error types.

use crate::{mail::MailError, oauth::OAuthError};
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Username or email already registered
    #[error("User already exists")]
    UserExists,

    /// Invalid username format
    #[error("Invalid username format.")]
    InvalidUsername,

    /// Invalid email format
    #[error("Invalid email format.")]
    InvalidEmail,

    /// Password too short
    #[error("Password must be at least 6 characters long.")]
    WeakPassword,

    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password login attempted on a Google account
    #[error("Use Google Sign-In")]
    UseGoogleSignIn,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// No user registered with the given email
    #[error("No user found with this email address.")]
    EmailNotFound,

    /// Wrong or expired second-factor code
    #[error("Invalid 2FA code")]
    InvalidTwoFactorCode,

    /// Unknown or expired reset token
    #[error("Invalid or expired reset token.")]
    InvalidResetToken,

    /// A Google callback is already being processed
    #[error("Duplicate request")]
    DuplicateRequest,

    /// Identity provider failure
    #[error("Google sign-in failed: {0}")]
    OAuth(#[from] OAuthError),

    /// Code or link could not be delivered
    #[error("Email delivery failed: {0}")]
    Mail(#[from] MailError),

    /// JWT token error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database, provider and JWT errors are sanitized.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::HashingFailed => "Internal Server Error".to_string(),
            AuthError::OAuth(_) => "Google sign-in failed".to_string(),
            AuthError::Mail(_) => "Failed to send email".to_string(),
            AuthError::JwtError(_) => "Authentication failed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_internals() {
        let err = AuthError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal Server Error");

        let err = AuthError::OAuth(OAuthError::MissingEmail);
        assert_eq!(err.client_message(), "Google sign-in failed");

        assert_eq!(AuthError::UserExists.client_message(), "User already exists");
    }
}
