//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use gang_arcade::{db::DatabaseConfig, mail::SmtpSettings, oauth::GoogleOAuthConfig};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// SMTP relay; `None` logs emails instead of sending them
    pub smtp: Option<SmtpSettings>,
    /// Google OAuth client; `None` disables Google sign-in
    pub google: Option<GoogleOAuthConfig>,
    /// Base URL of the web client, used in password reset links
    pub frontend_base_url: String,
    /// Directory for uploaded profile pictures
    pub upload_dir: PathBuf,
    /// Presence sweeper settings
    pub presence: PresenceConfig,
    /// Prometheus listener; `None` disables metrics export
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Access token lifetime in hours
    pub jwt_ttl_hours: i64,
}

/// How often idle users are marked offline
#[derive(Debug, Clone, Copy)]
pub struct PresenceConfig {
    pub sweep_interval: Duration,
    pub idle_after: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            database_url_override,
        )
    }

    /// Load configuration through `lookup` instead of the process environment
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match lookup("SERVER_BIND") {
                Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{raw}' is not an IP:PORT address"),
                })?,
                None => SocketAddr::from(([0, 0, 0, 0], 8080)),
            },
        };

        let defaults = DatabaseConfig::development();
        let database = DatabaseConfig {
            database_url: database_url_override
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            max_connections: parse_lookup(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_lookup(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_lookup(
                &lookup,
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_lookup(&lookup, "DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_lookup(&lookup, "DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        };

        // Security configuration (REQUIRED)
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            lookup("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let security = SecurityConfig {
            jwt_secret,
            password_pepper,
            jwt_ttl_hours: parse_lookup(&lookup, "JWT_TTL_HOURS", 24),
        };

        // Mail is optional but all-or-nothing
        let smtp = match (
            lookup("SMTP_HOST"),
            lookup("SMTP_USERNAME"),
            lookup("SMTP_PASSWORD"),
        ) {
            (Some(host), Some(username), Some(password)) => Some(SmtpSettings {
                from: lookup("SMTP_FROM").unwrap_or_else(|| format!("Gang HQ <{username}>")),
                host,
                username,
                password,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "SMTP_HOST".to_string(),
                    reason: "SMTP_HOST, SMTP_USERNAME and SMTP_PASSWORD must be set together"
                        .to_string(),
                });
            }
        };

        let frontend_base_url =
            lookup("FRONTEND_BASE_URL").unwrap_or_else(|| "http://localhost:3000".to_string());

        let google = match (lookup("GOOGLE_CLIENT_ID"), lookup("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_uri: lookup("GOOGLE_REDIRECT_URI")
                    .unwrap_or_else(|| format!("{frontend_base_url}/auth/google/callback")),
            }),
            _ => None,
        };

        let presence = PresenceConfig {
            sweep_interval: Duration::from_secs(parse_lookup(&lookup, "PRESENCE_SWEEP_SECS", 60)),
            idle_after: Duration::from_secs(parse_lookup(&lookup, "PRESENCE_IDLE_SECS", 180)),
        };

        let metrics_bind = match lookup("METRICS_BIND") {
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{raw}' is not an IP:PORT address"),
            })?),
            None => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            security,
            smtp,
            google,
            frontend_base_url,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            presence,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.security.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.security.jwt_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_TTL_HOURS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.presence.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "PRESENCE_SWEEP_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.presence.idle_after < self.presence.sweep_interval {
            return Err(ConfigError::Invalid {
                var: "PRESENCE_IDLE_SECS".to_string(),
                reason: format!(
                    "Must be at least the sweep interval ({}s)",
                    self.presence.sweep_interval.as_secs()
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_lookup<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned(), None, None)
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("PASSWORD_PEPPER", "0123456789abcdef"),
        ]
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_defaults() {
        let config = load(&required()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database.database_url, "sqlite://database.db");
        assert_eq!(config.security.jwt_ttl_hours, 24);
        assert!(config.smtp.is_none());
        assert!(config.google.is_none());
        assert!(config.metrics_bind.is_none());
        assert_eq!(config.presence.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.presence.idle_after, Duration::from_secs(180));
    }

    #[test]
    fn test_missing_secret() {
        let err = load(&[("PASSWORD_PEPPER", "0123456789abcdef")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_short_secret_fails_validation() {
        let config = load(&[("JWT_SECRET", "short"), ("PASSWORD_PEPPER", "0123456789abcdef")])
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_overrides_win() {
        let vars: HashMap<&str, &str> = required().into_iter().collect();
        let config = ServerConfig::from_lookup(
            |key| vars.get(key).map(|v| v.to_string()),
            Some("127.0.0.1:9000".parse().unwrap()),
            Some("sqlite::memory:".to_string()),
        )
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database.database_url, "sqlite::memory:");
    }

    #[test]
    fn test_partial_smtp_is_rejected() {
        let mut vars = required();
        vars.push(("SMTP_HOST", "smtp.example.com"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { var, .. }) if var == "SMTP_HOST"));
    }

    #[test]
    fn test_optional_integrations() {
        let mut vars = required();
        vars.extend([
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "gang@example.com"),
            ("SMTP_PASSWORD", "secret"),
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "shh"),
            ("FRONTEND_BASE_URL", "https://arcade.example.com"),
            ("METRICS_BIND", "127.0.0.1:9090"),
        ]);
        let config = load(&vars).unwrap();

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.from, "Gang HQ <gang@example.com>");
        let google = config.google.unwrap();
        assert_eq!(
            google.redirect_uri,
            "https://arcade.example.com/auth/google/callback"
        );
        assert_eq!(config.metrics_bind.unwrap().port(), 9090);
    }

    #[test]
    fn test_bad_bind_address() {
        let mut vars = required();
        vars.push(("SERVER_BIND", "not-an-address"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_idle_shorter_than_sweep() {
        let mut vars = required();
        vars.push(("PRESENCE_IDLE_SECS", "10"));
        let config = load(&vars).unwrap();
        assert!(config.validate().is_err());
    }
}
