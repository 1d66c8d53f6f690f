use axum::{Extension, Json, extract::State};

use wave_types::api::{Claims, ProfileResponse, UpdateProfileRequest, UpdateProfileResponse};

use crate::auth::{AppState, profile_from_row};
use crate::error::ApiError;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let row = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse {
        user: profile_from_row(&row)?,
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let id = claims.sub.to_string();

    if state.db.get_user_by_id(&id)?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }

    // Empty-string names are treated as absent, matching avatar semantics
    // where an explicit empty string clears the reference.
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    state.db.update_profile(&id, name, req.avatar.as_deref())?;

    let row = state
        .db
        .get_user_by_id(&id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".into(),
        user: profile_from_row(&row)?,
    }))
}
