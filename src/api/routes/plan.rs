//! Plan Routes
//!
//! - POST /api/v1/plan - Calorie and macro targets from body stats

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analytics::{plan, PlanInput};
use crate::api::auth::AuthUser;
use crate::api::dto::{ApiResponse, PlanRequest, PlanResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/plan
///
/// Uses `input` when given, otherwise the stored profile. With `apply`, the
/// resulting goals are written to the profile.
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<PlanRequest>,
) -> ApiResult<Json<ApiResponse<PlanResponse>>> {
    let profile = state.load_profile(user.id()).await?;

    let input = match (req.input, &profile) {
        (Some(input), _) => input,
        (None, Some(profile)) => PlanInput::from_profile(profile)?,
        (None, None) => return Err(ApiError::NotFound("profile".to_string())),
    };

    let nutrition_plan = plan::calculate(&input)?;

    if req.apply {
        let mut profile = profile.ok_or_else(|| ApiError::NotFound("profile".to_string()))?;
        nutrition_plan.apply_to(&mut profile);
        profile.updated_at = chrono::Utc::now().timestamp_millis();
        state.save_profile(&profile).await?;
        tracing::info!(
            user_id = %user.id(),
            calories = nutrition_plan.daily_calories,
            "Nutrition plan applied"
        );
    }

    Ok(Json(ApiResponse::ok(PlanResponse {
        plan: nutrition_plan,
        applied: req.apply,
    })))
}
