//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{
        AccessTokenClaims, LoginRequest, PasswordResetConfirm, PasswordResetRequest,
        RegisterRequest, User, UserId, VerifyTwoFactorRequest,
    },
};
use crate::{
    friendship::manager::seed_rows,
    mail::{Mailer, templates},
    oauth::{DisabledProvider, GoogleProfile, IdentityProvider},
    profile::AuthProvider,
    validation::{self, MAX_USERNAME_LEN},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use subtle::ConstantTimeEq;

/// Default profile picture shipped with the frontend
pub const DEFAULT_PROFILE_PIC: &str = "/profile-pics/default-profile.jpg";

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    pool: Arc<SqlitePool>,
    pepper: String,
    jwt_secret: String,
    mailer: Arc<dyn Mailer>,
    identity: Arc<dyn IdentityProvider>,
    frontend_base_url: String,
    access_token_duration: Duration,
    two_factor_duration: Duration,
    reset_token_duration: Duration,
    google_in_flight: Arc<AtomicBool>,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `pepper` - Server-side pepper for password hashing
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `mailer` - Delivery for codes, reset links and welcome messages
    pub fn new(
        pool: Arc<SqlitePool>,
        pepper: String,
        jwt_secret: String,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            pool,
            pepper,
            jwt_secret,
            mailer,
            identity: Arc::new(DisabledProvider),
            frontend_base_url: "http://localhost:3000".to_string(),
            access_token_duration: Duration::hours(24),
            two_factor_duration: Duration::minutes(10),
            reset_token_duration: Duration::hours(1),
            google_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use `provider` for Google sign-in
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = provider;
        self
    }

    /// Base URL that password reset links point to
    pub fn with_frontend_base_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Lifetime of issued access tokens
    pub fn with_access_token_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }

    /// Register a new user
    ///
    /// The account row and its friendship rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidUsername` - Username format invalid
    /// * `AuthError::InvalidEmail` - Email format invalid
    /// * `AuthError::WeakPassword` - Password too short
    /// * `AuthError::UserExists` - Username or email already registered
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        if !validation::is_valid_username(&request.username) {
            return Err(AuthError::InvalidUsername);
        }
        if !validation::is_valid_email(&request.email) {
            return Err(AuthError::InvalidEmail);
        }
        if !validation::is_valid_password(&request.password) {
            return Err(AuthError::WeakPassword);
        }

        let existing = sqlx::query("SELECT id FROM users WHERE username = ? OR email = ?")
            .bind(&request.username)
            .bind(&request.email)
            .fetch_optional(self.pool.as_ref())
            .await?;
        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = self
            .insert_user(
                &request.username,
                Some(&password_hash),
                &request.email,
                AuthProvider::Email,
            )
            .await?;

        log::info!("Registered user {} ({})", user.username, user.id);
        self.send_welcome(&user).await;
        Ok(user)
    }

    /// First login step: check the password and email a second-factor code
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown user or wrong password
    /// * `AuthError::UseGoogleSignIn` - Account was created through Google
    pub async fn login(&self, request: LoginRequest) -> AuthResult<()> {
        if !validation::is_valid_username(&request.username) {
            return Err(AuthError::InvalidUsername);
        }

        let row = sqlx::query(
            "SELECT id, username, email, password_hash, auth_provider FROM users WHERE username = ?",
        )
        .bind(&request.username)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let user = user_from_row(&row);
        if user.auth_provider == AuthProvider::Google {
            return Err(AuthError::UseGoogleSignIn);
        }

        let password_hash: Option<String> = row.get("password_hash");
        let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;
        self.verify_password(&request.password, &password_hash)?;

        let code = random_hex(3);
        let expires_at = (Utc::now() + self.two_factor_duration).timestamp();
        sqlx::query("UPDATE users SET two_factor_code = ?, two_factor_expires_at = ? WHERE id = ?")
            .bind(&code)
            .bind(expires_at)
            .bind(user.id)
            .execute(self.pool.as_ref())
            .await?;

        self.mailer
            .send(templates::two_factor_code(&user.email, &user.username, &code))
            .await?;

        log::debug!("Second-factor code issued for {}", user.username);
        Ok(())
    }

    /// Second login step: exchange the emailed code for an access token
    ///
    /// The code is single use and the user is marked online.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - Unknown user
    /// * `AuthError::InvalidTwoFactorCode` - Wrong, missing or expired code
    pub async fn verify_2fa(&self, request: VerifyTwoFactorRequest) -> AuthResult<String> {
        if !validation::is_valid_username(&request.username) {
            return Err(AuthError::InvalidUsername);
        }

        let row = sqlx::query(
            r#"
            SELECT id, username, email, auth_provider, two_factor_code, two_factor_expires_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(&request.username)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(AuthError::UserNotFound)?;

        let stored: Option<String> = row.get("two_factor_code");
        let expires_at: Option<i64> = row.get("two_factor_expires_at");

        let matches = stored
            .as_deref()
            .map(|stored| bool::from(stored.as_bytes().ct_eq(request.code.as_bytes())))
            .unwrap_or(false);
        let expired = expires_at.is_none_or(|at| at < Utc::now().timestamp());
        if !matches || expired {
            return Err(AuthError::InvalidTwoFactorCode);
        }

        let user = user_from_row(&row);
        sqlx::query(
            r#"
            UPDATE users
            SET two_factor_code = NULL, two_factor_expires_at = NULL,
                online_status = 'online', last_activity = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now().timestamp_millis())
        .bind(user.id)
        .execute(self.pool.as_ref())
        .await?;

        self.generate_access_token(user.id, &user.username)
    }

    /// Email a password reset link
    ///
    /// Only a SHA-256 digest of the token is stored.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Email format invalid
    /// * `AuthError::EmailNotFound` - No account uses this email
    pub async fn request_password_reset(&self, request: PasswordResetRequest) -> AuthResult<()> {
        if !validation::is_valid_email(&request.email) {
            return Err(AuthError::InvalidEmail);
        }

        let row = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(&request.email)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(AuthError::EmailNotFound)?;
        let user_id: UserId = row.get("id");

        let token = random_hex(20);
        let expires_at = (Utc::now() + self.reset_token_duration).timestamp();
        sqlx::query("UPDATE users SET reset_token_hash = ?, reset_expires_at = ? WHERE id = ?")
            .bind(hash_token(&token))
            .bind(expires_at)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        let link = format!("{}/change-password?token={}", self.frontend_base_url, token);
        self.mailer
            .send(templates::password_reset(&request.email, &link))
            .await?;

        log::info!("Password reset requested for user {user_id}");
        Ok(())
    }

    /// Set a new password using a reset token
    ///
    /// # Errors
    ///
    /// * `AuthError::WeakPassword` - Password too short
    /// * `AuthError::InvalidResetToken` - Unknown, used or expired token
    pub async fn update_password(&self, request: PasswordResetConfirm) -> AuthResult<()> {
        if !validation::is_valid_password(&request.password) {
            return Err(AuthError::WeakPassword);
        }

        let token_hash = hash_token(&request.token);
        let row = sqlx::query("SELECT id, reset_expires_at FROM users WHERE reset_token_hash = ?")
            .bind(&token_hash)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let expires_at: Option<i64> = row.get("reset_expires_at");
        if expires_at.is_none_or(|at| at < Utc::now().timestamp()) {
            return Err(AuthError::InvalidResetToken);
        }

        let user_id: UserId = row.get("id");
        let password_hash = self.hash_password(&request.password)?;
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, reset_token_hash = NULL, reset_expires_at = NULL
            WHERE id = ?
            "#,
        )
        .bind(&password_hash)
        .bind(user_id)
        .execute(self.pool.as_ref())
        .await?;

        log::info!("Password updated for user {user_id}");
        Ok(())
    }

    /// Sign in (registering on first visit) with a Google authorization code
    ///
    /// Only one callback is processed at a time.
    ///
    /// # Errors
    ///
    /// * `AuthError::DuplicateRequest` - Another callback is in flight
    /// * `AuthError::OAuth` - Code exchange or profile fetch failed
    pub async fn google_login(&self, code: &str) -> AuthResult<String> {
        let _guard = InFlightGuard::acquire(&self.google_in_flight)?;

        let profile = self.identity.exchange_code(code).await?;
        let user = match self.find_by_email(&profile.email).await? {
            Some(user) => user,
            None => self.register_google_user(&profile).await?,
        };

        sqlx::query("UPDATE users SET online_status = 'online', last_activity = ? WHERE id = ?")
            .bind(Utc::now().timestamp_millis())
            .bind(user.id)
            .execute(self.pool.as_ref())
            .await?;

        log::info!("Google sign-in for {}", user.username);
        self.generate_access_token(user.id, &user.username)
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    async fn register_google_user(&self, profile: &GoogleProfile) -> AuthResult<User> {
        let base = username_base(&profile.name);
        let mut candidate = base.clone();
        while self.username_taken(&candidate).await? {
            candidate = format!("{}{}", base, random_suffix());
        }

        let user = self
            .insert_user(&candidate, None, &profile.email, AuthProvider::Google)
            .await?;

        log::info!("Registered Google user {} ({})", user.username, user.id);
        self.send_welcome(&user).await;
        Ok(user)
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: Option<&str>,
        email: &str,
        provider: AuthProvider,
    ) -> AuthResult<User> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, email, profile_pic, auth_provider)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, username, email, auth_provider
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(DEFAULT_PROFILE_PIC)
        .bind(provider.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::UserExists,
            err => AuthError::Database(err),
        })?;

        let user = user_from_row(&row);
        seed_rows(&mut *tx, user.id, &user.username).await?;
        tx.commit().await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, auth_provider FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn username_taken(&self, username: &str) -> AuthResult<bool> {
        let row = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.is_some())
    }

    async fn send_welcome(&self, user: &User) {
        let email = templates::registration_success(&user.email, &user.username);
        if let Err(e) = self.mailer.send(email).await {
            log::warn!("Welcome email to {} failed: {}", user.username, e);
        }
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
        let argon2 = Argon2::default();

        argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    /// Generate JWT access token
    fn generate_access_token(&self, user_id: UserId, username: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            username: username.to_string(),
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }
}

/// Clears the in-flight flag when the callback finishes, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> AuthResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AuthError::DuplicateRequest)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        auth_provider: row
            .get::<String, _>("auth_provider")
            .parse()
            .unwrap_or_default(),
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill(bytes.as_mut_slice());
    hex::encode(bytes)
}

fn random_suffix() -> u32 {
    rand::rng().random_range(0..10_000)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Display name squeezed into a valid username, leaving room for a suffix.
fn username_base(name: &str) -> String {
    let base: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_USERNAME_LEN - 4)
        .collect();
    if base.is_empty() {
        "player".to_string()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_length() {
        let code = random_hex(3);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(random_hex(20).len(), 40);
    }

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }

    #[test]
    fn test_username_base() {
        assert_eq!(username_base("Ana Banana"), "AnaBanana");
        assert_eq!(username_base("  "), "player");
        assert_eq!(username_base("Željko Ž"), "eljko");
        assert!(username_base(&"x".repeat(100)).len() <= MAX_USERNAME_LEN - 4);
    }

    #[test]
    fn test_in_flight_guard() {
        let flag = AtomicBool::new(false);
        {
            let _guard = InFlightGuard::acquire(&flag).unwrap();
            assert!(matches!(
                InFlightGuard::acquire(&flag),
                Err(AuthError::DuplicateRequest)
            ));
        }
        assert!(InFlightGuard::acquire(&flag).is_ok());
    }
}
