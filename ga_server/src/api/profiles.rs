//! Profile API handlers, plus the presence heartbeat.

use axum::{
    Json,
    extract::{Extension, Multipart, Path, State},
};
use gang_arcade::{
    auth::{AccessTokenClaims, UserId},
    profile::{LeaderboardEntry, Profile, ProfileError, UpdateFieldRequest},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    error::{ApiResult, api_error, error_response},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub profile_pic: String,
}

/// Mark the caller online as of now.
pub async fn update_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> ApiResult<SuccessResponse> {
    state.presence.touch(claims.sub).await.map_err(|e| {
        tracing::error!(user_id = claims.sub, "Presence update failed: {e}");
        api_error(ProfileError::Database(e))
    })?;

    Ok(SuccessResponse::ok())
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Profile> {
    let profile = state
        .profile_manager
        .get_profile(id)
        .await
        .map_err(api_error)?;

    Ok(Json(profile))
}

pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Profile> {
    let profile = state
        .profile_manager
        .get_public_profile(&username)
        .await
        .map_err(api_error)?;

    Ok(Json(profile))
}

/// Leaderboard of every player's wins and losses.
pub async fn all_profiles(State(state): State<AppState>) -> ApiResult<Vec<LeaderboardEntry>> {
    let profiles = state
        .profile_manager
        .all_profiles()
        .await
        .map_err(api_error)?;

    Ok(Json(profiles))
}

/// Change one editable field of the caller's own profile.
///
/// # Errors
///
/// - `400 Bad Request`: Field not editable or value rejected
/// - `403 Forbidden`: `id` is not the caller
pub async fn update_field(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<UserId>,
    Json(payload): Json<UpdateFieldRequest>,
) -> ApiResult<SuccessResponse> {
    state
        .profile_manager
        .update_field(claims.sub, id, &payload.field, &payload.value)
        .await
        .map_err(api_error)?;

    Ok(SuccessResponse::ok())
}

/// Store the first file of a multipart form as the caller's picture.
///
/// # Errors
///
/// - `400 Bad Request`: No file, or not a JPEG, PNG or WebP image
/// - `403 Forbidden`: `id` is not the caller
/// - `413 Payload Too Large`: Over 5 MiB
pub async fn upload_profile_pic(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
    Path(id): Path<UserId>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(e.status(), format!("Multipart error: {e}")))?
    {
        if field.file_name().is_none() {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| error_response(e.status(), format!("Failed to read file: {e}")))?;

        let profile_pic = state
            .profile_manager
            .set_profile_pic(claims.sub, id, &content_type, &data)
            .await
            .map_err(api_error)?;

        return Ok(Json(UploadResponse {
            success: true,
            profile_pic,
        }));
    }

    Err(api_error(ProfileError::NoFile))
}
