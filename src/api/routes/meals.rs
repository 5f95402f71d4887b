//! Meal Routes
//!
//! - POST /api/v1/meals - Log a meal with its totals
//! - GET /api/v1/meals?timeframe=1W - Meals and per-day totals in a window

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::analytics::calories;
use crate::api::auth::AuthUser;
use crate::api::dto::{ApiResponse, LogMealRequest, MealEntry, MealHistory, TimeframeQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/meals
pub async fn log_meal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<LogMealRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MealEntry>>)> {
    let meal = req.into_record(Utc::now()).map_err(ApiError::Validation)?;
    let id = state.store.log_meal(user.id(), &meal)?;

    tracing::info!(
        user_id = %user.id(),
        id,
        calories = meal.total_calories,
        meal_type = meal.meal_type.as_str(),
        "Meal logged"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(MealEntry { id, meal }))))
}

/// GET /api/v1/meals
///
/// Daily totals use the profile's UTC offset, or UTC without a profile.
pub async fn list_meals(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<TimeframeQuery>,
) -> ApiResult<Json<ApiResponse<MealHistory>>> {
    let since = query.timeframe.since(Utc::now());
    let meals = state.store.meals(user.id(), since)?;

    let offset = state
        .load_profile(user.id())
        .await?
        .map(|p| p.utc_offset_minutes)
        .unwrap_or(0);
    let daily_totals = calories::daily_totals(&meals, offset);

    Ok(Json(ApiResponse::ok(MealHistory {
        timeframe: query.timeframe,
        meals,
        daily_totals,
    })))
}
