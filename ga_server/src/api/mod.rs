//! HTTP API for the arcade backend.
//!
//! # Modules
//!
//! - [`auth`]: Registration, login with emailed code, password reset, Google sign-in
//! - [`friendships`]: Friend requests and the user directory
//! - [`profiles`]: Profiles, leaderboard, field edits and picture uploads
//! - [`games`]: Duels, tournaments and saved game sessions
//! - [`middleware`]: Bearer-token authentication for protected endpoints
//!
//! # Endpoints Overview
//!
//! ```text
//! GET   /health                                 - Health check (public)
//! POST  /register /login /verify-2fa            - Account flow (public)
//! POST  /reset-password /update-password        - Password reset (public)
//! GET   /auth/google/callback?code=             - Google sign-in (public)
//! GET   /info                                   - Token owner
//! POST  /friendships/request                    - Send friend request
//! GET   /friendships/requests                   - Incoming pending requests
//! GET   /friendships                            - Own friendship rows
//! PUT   /friendships/{accept,decline,unfriend}  - Answer or drop a friendship
//! GET   /users                                  - Everyone else
//! POST  /update-activity                        - Presence heartbeat
//! GET   /get-profile/{id}                       - Own profile
//! GET   /get-public-profile/{username}          - Someone's profile
//! GET   /get-all-profiles                       - Leaderboard
//! PATCH /update-field/{id}                      - Edit one profile field
//! POST  /upload-profile-pic/{id}                - Multipart picture upload
//! POST  /game-achievement                       - Placement announcement
//! POST  /start-duel-ping-pong-game              - Validate a duel
//! POST  /start-tournament-game                  - Create a bracket
//! GET   /tournaments/{id}                       - Bracket state
//! POST  /tournaments/{id}/outcome               - Record a match winner
//! POST  /api/save-game-session                  - Store a finished session
//! GET   /get-games/{username}                   - Stored sessions
//! ```
//!
//! Uploaded pictures are served under `/profile-pics/uploads`.

pub mod auth;
pub mod error;
pub mod friendships;
pub mod games;
pub mod middleware;
pub mod profiles;
pub mod rate_limiter;
pub mod request_id;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post, put},
};
use gang_arcade::{
    AuthManager, FriendshipManager, GameManager, PresenceTracker, ProfileManager,
    profile::MAX_PICTURE_BYTES,
};
use rate_limiter::KeyedRateLimiter;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub friendship_manager: Arc<FriendshipManager>,
    pub profile_manager: Arc<ProfileManager>,
    pub game_manager: Arc<GameManager>,
    pub presence: Arc<PresenceTracker>,
    pub pool: Arc<SqlitePool>,
    /// Per-username attempt windows for `/login` and `/verify-2fa`
    pub login_limiter: Arc<KeyedRateLimiter>,
}

impl AppState {
    /// Build every manager over one pool
    pub fn new(
        pool: Arc<SqlitePool>,
        auth_manager: AuthManager,
        game_manager: GameManager,
        profile_manager: ProfileManager,
    ) -> Self {
        Self {
            auth_manager: Arc::new(auth_manager),
            friendship_manager: Arc::new(FriendshipManager::new(pool.clone())),
            profile_manager: Arc::new(profile_manager),
            game_manager: Arc::new(game_manager),
            presence: Arc::new(PresenceTracker::new(pool.clone())),
            pool,
            login_limiter: Arc::new(KeyedRateLimiter::login()),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.profile_manager.upload_dir());

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-2fa", post(auth::verify_2fa))
        .route("/reset-password", post(auth::reset_password))
        .route("/update-password", post(auth::update_password))
        .route("/auth/google/callback", get(auth::google_callback));

    let protected_routes = Router::new()
        .route("/info", get(auth::info))
        .route("/friendships/request", post(friendships::send_request))
        .route("/friendships/requests", get(friendships::pending_requests))
        .route("/friendships", get(friendships::list))
        .route("/friendships/accept", put(friendships::accept))
        .route("/friendships/decline", put(friendships::decline))
        .route("/friendships/unfriend", put(friendships::unfriend))
        .route("/users", get(friendships::list_users))
        .route("/update-activity", post(profiles::update_activity))
        .route("/get-profile/{id}", get(profiles::get_profile))
        .route("/get-public-profile/{username}", get(profiles::get_public_profile))
        .route("/get-all-profiles", get(profiles::all_profiles))
        .route("/update-field/{id}", patch(profiles::update_field))
        .route(
            "/upload-profile-pic/{id}",
            // Room for the multipart envelope around a maximum-size picture
            post(profiles::upload_profile_pic).layer(DefaultBodyLimit::max(MAX_PICTURE_BYTES * 2)),
        )
        .route("/game-achievement", post(games::game_achievement))
        .route("/start-duel-ping-pong-game", post(games::start_duel))
        .route("/start-tournament-game", post(games::start_tournament))
        .route("/tournaments/{id}", get(games::tournament))
        .route("/tournaments/{id}/outcome", post(games::record_outcome))
        .route("/api/save-game-session", post(games::save_session))
        .route("/get-games/{username}", get(games::games_for))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/profile-pics/uploads", uploads)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","database":true,"version":"0.1.0","timestamp":"2026-10-18T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(state.pool.as_ref())
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
