//! Authentication module providing registration, login and access tokens.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - A short-lived second-factor code emailed after a correct password
//! - JWT access tokens (HS256)
//! - Password reset links with hashed, expiring tokens
//! - Google sign-in through an [`IdentityProvider`](crate::oauth::IdentityProvider)
//!
//! ## Example
//!
//! ```no_run
//! use gang_arcade::auth::{AuthManager, RegisterRequest};
//! use gang_arcade::db::Database;
//! use gang_arcade::mail::LogMailer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(db.pool().clone()),
//!         "secret_pepper".to_string(),
//!         "jwt_secret".to_string(),
//!         Arc::new(LogMailer),
//!     );
//!
//!     let request = RegisterRequest {
//!         username: "player1".to_string(),
//!         password: "hunter22".to_string(),
//!         email: "player@example.com".to_string(),
//!     };
//!
//!     let user = auth.register(request).await?;
//!     println!("Registered user: {}", user.username);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{
    AccessTokenClaims, LoginRequest, PasswordResetConfirm, PasswordResetRequest, RegisterRequest,
    User, UserId, VerifyTwoFactorRequest,
};
