//! Gang arcade HTTP server.
//!
//! Serves the JSON API, keeps presence fresh with a background sweep and
//! shuts down cleanly on Ctrl-C.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use ga_server::{
    api::{AppState, create_router},
    config::ServerConfig,
    logging, metrics,
};
use gang_arcade::{
    AuthManager, GameManager, PresenceTracker, ProfileManager,
    db::Database,
    mail::{LogMailer, Mailer, SmtpMailer},
    oauth::{DisabledProvider, GoogleOAuth, IdentityProvider},
};
use pico_args::Arguments;

const HELP: &str = "\
Run the Gang arcade API server

USAGE:
  ga_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 0.0.0.0:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or sqlite://database.db]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET               JWT signing secret (required, 32+ chars)
  PASSWORD_PEPPER          Password hashing pepper (required, 16+ chars)
  SMTP_HOST                Outgoing mail server; without it mail is only logged
  GOOGLE_CLIENT_ID         Enables Google sign-in together with GOOGLE_CLIENT_SECRET
  METRICS_BIND             Prometheus listener (e.g., 127.0.0.1:9090)
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let db_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    let config = ServerConfig::from_env(bind, db_url)?;
    config.validate()?;

    logging::init();
    tracing::info!("Starting Gang arcade server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(anyhow::Error::msg)?;
        tracing::info!("Metrics available at http://{metrics_bind}/metrics");
    }

    tracing::info!("Opening database: {}", config.database.database_url);
    let db = Database::new(&config.database)
        .await
        .context("Failed to open database")?;
    let pool = Arc::new(db.pool().clone());

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!("Sending mail through {}", smtp.host);
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            tracing::warn!("SMTP not configured, outgoing mail is only logged");
            Arc::new(LogMailer)
        }
    };

    let identity: Arc<dyn IdentityProvider> = match &config.google {
        Some(google) => Arc::new(GoogleOAuth::new(google.clone())),
        None => {
            tracing::warn!("Google sign-in disabled");
            Arc::new(DisabledProvider)
        }
    };

    let auth_manager = AuthManager::new(
        pool.clone(),
        config.security.password_pepper.clone(),
        config.security.jwt_secret.clone(),
        mailer.clone(),
    )
    .with_identity_provider(identity)
    .with_frontend_base_url(config.frontend_base_url.clone())
    .with_access_token_duration(chrono::Duration::hours(config.security.jwt_ttl_hours));

    let state = AppState::new(
        pool.clone(),
        auth_manager,
        GameManager::new(pool.clone(), mailer),
        ProfileManager::new(pool.clone(), config.upload_dir.clone()),
    );

    spawn_presence_sweeper(state.presence.clone(), &config);

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    tracing::info!("Listening on {}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically mark users without a recent heartbeat offline
fn spawn_presence_sweeper(presence: Arc<PresenceTracker>, config: &ServerConfig) {
    let every = config.presence.sweep_interval;
    let idle = config.presence.idle_after;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match presence.sweep(idle).await {
                Ok(count) => metrics::presence_swept(count),
                Err(e) => tracing::error!("Presence sweep failed: {e}"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
