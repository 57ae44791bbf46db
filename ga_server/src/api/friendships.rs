//! Friendship API handlers.
//!
//! Every user has a row towards every other user in each direction; these
//! endpoints move a pair between `Not Friend`, `Pending` and `Friend`.

use axum::{
    Json,
    extract::{Extension, State},
};
use gang_arcade::{
    auth::{AccessTokenClaims, UserId},
    friendship::{Friendship, FriendshipView, PairRequest, UserSummary},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    auth::MessageResponse,
    error::{ApiResult, api_error},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendRequestPayload {
    pub receiver_id: UserId,
}

/// Ask `receiver_id` to be friends.
///
/// # Errors
///
/// - `400 Bad Request`: Request to self, or already friends
/// - `404 Not Found`: No such user
pub async fn send_request(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(payload): Json<FriendRequestPayload>,
) -> ApiResult<MessageResponse> {
    state
        .friendship_manager
        .send_request(claims.sub, payload.receiver_id)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new("Set Friend Status to Pending"))
}

/// Requests waiting for the caller's answer.
pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> ApiResult<Vec<Friendship>> {
    let requests = state
        .friendship_manager
        .pending_requests(claims.sub)
        .await
        .map_err(api_error)?;

    Ok(Json(requests))
}

/// The caller's outgoing rows with each receiver's online status.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> ApiResult<Vec<FriendshipView>> {
    let friendships = state
        .friendship_manager
        .list(claims.sub)
        .await
        .map_err(api_error)?;

    Ok(Json(friendships))
}

/// Accept a pending request addressed to the caller.
///
/// # Errors
///
/// - `403 Forbidden`: The caller is not the receiver
/// - `404 Not Found`: No pending request for the pair
pub async fn accept(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(pair): Json<PairRequest>,
) -> ApiResult<MessageResponse> {
    state
        .friendship_manager
        .accept(claims.sub, pair)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new(
        "Friend request accepted and status updated.",
    ))
}

/// Decline a request addressed to the caller.
pub async fn decline(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(pair): Json<PairRequest>,
) -> ApiResult<MessageResponse> {
    state
        .friendship_manager
        .decline(claims.sub, pair)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new(
        "Friend request declined and status updated.",
    ))
}

/// Drop a friendship the caller is part of.
pub async fn unfriend(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Json(pair): Json<PairRequest>,
) -> ApiResult<MessageResponse> {
    state
        .friendship_manager
        .unfriend(claims.sub, pair)
        .await
        .map_err(api_error)?;

    Ok(MessageResponse::new("Friend unfriended and status updated."))
}

/// Everyone except the caller.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> ApiResult<Vec<UserSummary>> {
    let users = state
        .friendship_manager
        .list_users(claims.sub)
        .await
        .map_err(api_error)?;

    Ok(Json(users))
}
