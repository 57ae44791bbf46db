//! Google OAuth 2.0 authorization-code exchange.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// OAuth errors
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider rejected the code: {0}")]
    Rejected(String),

    #[error("Identity provider returned no email")]
    MissingEmail,

    #[error("Google sign-in is not configured")]
    NotConfigured,
}

pub type OAuthResult<T> = Result<T, OAuthError>;

/// The part of the provider's profile the arcade uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    /// Display name, may contain spaces
    #[serde(default)]
    pub name: String,
}

/// Exchanges an authorization code for the signed-in user's profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> OAuthResult<GoogleProfile>;
}

/// Google client credentials
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    #[serde(default)]
    name: String,
}

/// [`IdentityProvider`] backed by Google's token and userinfo endpoints.
pub struct GoogleOAuth {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuth {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuth {
    async fn exchange_code(&self, code: &str) -> OAuthResult<GoogleProfile> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await?
            .json()
            .await?;

        let access_token = match token.access_token {
            Some(access_token) => access_token,
            None => {
                let reason = token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| "no access token".to_string());
                return Err(OAuthError::Rejected(reason));
            }
        };

        let info: UserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let email = info.email.ok_or(OAuthError::MissingEmail)?;
        log::debug!("Google profile fetched for {email}");

        Ok(GoogleProfile {
            email,
            name: info.name,
        })
    }
}

/// Provider used when Google credentials are absent.
#[derive(Debug, Default)]
pub struct DisabledProvider;

#[async_trait]
impl IdentityProvider for DisabledProvider {
    async fn exchange_code(&self, _code: &str) -> OAuthResult<GoogleProfile> {
        Err(OAuthError::NotConfigured)
    }
}

/// Provider answering every code with a fixed profile.
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    profile: GoogleProfile,
}

impl StaticIdentityProvider {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            profile: GoogleProfile {
                email: email.to_string(),
                name: name.to_string(),
            },
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn exchange_code(&self, code: &str) -> OAuthResult<GoogleProfile> {
        if code.is_empty() {
            return Err(OAuthError::Rejected("empty code".to_string()));
        }
        Ok(self.profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticIdentityProvider::new("ana@example.com", "Ana Banana");
        let profile = provider.exchange_code("abc").await.unwrap();
        assert_eq!(profile.email, "ana@example.com");
        assert_eq!(profile.name, "Ana Banana");
        assert!(provider.exchange_code("").await.is_err());
    }

    #[tokio::test]
    async fn test_disabled_provider() {
        assert!(matches!(
            DisabledProvider.exchange_code("abc").await,
            Err(OAuthError::NotConfigured)
        ));
    }

    #[test]
    fn test_token_error_parsing() {
        let body = r#"{"error":"invalid_grant","error_description":"Bad Request"}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert!(token.access_token.is_none());
        assert_eq!(token.error_description.as_deref(), Some("Bad Request"));
    }
}
