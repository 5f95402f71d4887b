//! Profile Routes
//!
//! - GET /api/v1/profile - Current user's profile
//! - PUT /api/v1/profile - Create or replace the profile
//! - PATCH /api/v1/profile - Update a single field

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::auth::AuthUser;
use crate::api::dto::{ApiResponse, ProfileRequest, ProfileUpdate};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::UserProfile;

/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = state
        .load_profile(user.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("profile".to_string()))?;

    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/v1/profile
pub async fn put_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = req.into_profile(user.id()).map_err(ApiError::Validation)?;
    state.save_profile(&profile).await?;

    tracing::info!(user_id = %user.id(), goal = %profile.goal_type, "Profile saved");

    Ok(Json(ApiResponse::ok(profile)))
}

/// PATCH /api/v1/profile
///
/// Body is a single tagged update, e.g.
/// `{"field": "targetWeight", "value": {"value": 165, "unit": "lb"}}`.
pub async fn patch_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let mut profile = state
        .load_profile(user.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("profile".to_string()))?;

    tracing::debug!(user_id = %user.id(), update = ?update, "Applying profile update");
    update.apply(&mut profile).map_err(ApiError::Validation)?;
    state.save_profile(&profile).await?;

    Ok(Json(ApiResponse::ok(profile)))
}
