//! Game API handlers: duels, tournaments and stored sessions.

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use gang_arcade::{
    auth::AccessTokenClaims,
    games::{
        GameAchievementRequest, GameId, GameKind, GameSession, OutcomeRecorded, OutcomeRequest,
        SaveSessionRequest, StartDuelRequest, StartTournamentRequest,
    },
    tournament::BracketSnapshot,
};
use serde::Serialize;
use uuid::Uuid;

use super::{
    AppState,
    auth::MessageResponse,
    error::{ApiResult, api_error},
};
use crate::metrics;

#[derive(Debug, Serialize)]
pub struct TournamentCreatedResponse {
    pub message: String,
    pub id: Uuid,
    pub bracket: BracketSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SessionSavedResponse {
    pub success: bool,
    pub id_game: GameId,
}

/// Validate a two-player ping-pong match hosted by a registered user.
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields or malformed usernames
/// - `401 Unauthorized`: The host is not registered
pub async fn start_duel(
    State(state): State<AppState>,
    Json(payload): Json<StartDuelRequest>,
) -> ApiResult<MessageResponse> {
    state
        .game_manager
        .start_duel(&payload)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new("Duel game session created successfully"))
}

/// Seed a bracket from the host and their guests.
///
/// The response carries the tournament id and its first-round pairings.
pub async fn start_tournament(
    State(state): State<AppState>,
    Json(payload): Json<StartTournamentRequest>,
) -> ApiResult<TournamentCreatedResponse> {
    let kind = payload.game_name.unwrap_or_default();
    let started = state
        .game_manager
        .start_tournament(payload)
        .await
        .map_err(api_error)?;

    metrics::tournaments_started_total(kind.as_str());
    Ok(Json(TournamentCreatedResponse {
        message: "Tournament session created successfully".to_string(),
        id: started.id,
        bracket: started.bracket,
    }))
}

pub async fn tournament(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<BracketSnapshot> {
    let bracket = state.game_manager.tournament(id).await.map_err(api_error)?;
    Ok(Json(bracket))
}

/// Record the winner of one matchup; only the host may report.
///
/// # Errors
///
/// - `400 Bad Request`: Slot already decided, unknown slot or winner not in the matchup
/// - `403 Forbidden`: The caller is not the host
/// - `404 Not Found`: No live tournament with this id
pub async fn record_outcome(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OutcomeRequest>,
) -> ApiResult<OutcomeRecorded> {
    let recorded = state
        .game_manager
        .record_tournament_outcome(&claims.username, id, payload.slot, &payload.winner)
        .await
        .map_err(api_error)?;

    if let Some(id_game) = recorded.saved_game {
        tracing::info!(tournament = %id, id_game, "Tournament finished");
    }
    Ok(Json(recorded))
}

/// Store a finished session for the caller and update win/loss counters.
pub async fn save_session(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(payload): Json<SaveSessionRequest>,
) -> ApiResult<SessionSavedResponse> {
    let kind = payload.game_name.parse::<GameKind>().ok();
    let id_game = state
        .game_manager
        .save_session(&claims.username, payload)
        .await
        .map_err(api_error)?;

    if let Some(kind) = kind {
        metrics::game_sessions_saved_total(kind.as_str());
    }
    Ok(Json(SessionSavedResponse {
        success: true,
        id_game,
    }))
}

/// Sessions stored for `username`.
pub async fn games_for(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Vec<GameSession>> {
    let games = state
        .game_manager
        .games_for(&username)
        .await
        .map_err(api_error)?;

    Ok(Json(games))
}

/// Announce a placement; first place is congratulated by email.
pub async fn game_achievement(
    State(state): State<AppState>,
    Json(payload): Json<GameAchievementRequest>,
) -> ApiResult<MessageResponse> {
    let message = state
        .game_manager
        .game_achievement(&payload)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new(message))
}
