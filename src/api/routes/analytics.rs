//! Analytics Routes
//!
//! - POST /api/v1/analytics - Weight, calorie and goal analytics for a timeframe

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::analytics;
use crate::api::auth::AuthUser;
use crate::api::dto::{AnalyticsData, AnalyticsRequest, ApiResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/analytics
///
/// Runs the analytics pipeline over the requested window. AI insights and
/// food recommendations are only generated when asked for, and never fail
/// the request.
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<AnalyticsRequest>,
) -> ApiResult<Json<ApiResponse<AnalyticsData>>> {
    let profile = state
        .load_profile(user.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("profile".to_string()))?;

    let now = Utc::now();
    let since = req.timeframe.since(now);
    let samples = state.store.weight_samples(user.id(), since)?;
    let meals = state.store.meals(user.id(), since)?;

    let report = analytics::analyze(&profile, &samples, &meals, now)?;

    let engine = &state.insight_engine;
    let (ai_insights, recommendations) = tokio::join!(
        async {
            if req.include_ai {
                Some(engine.generate_insights(&profile, &report).await)
            } else {
                None
            }
        },
        async {
            if req.include_food_recommendations {
                Some(engine.recommend_foods(&profile, &report).await)
            } else {
                None
            }
        }
    );

    tracing::info!(
        user_id = %user.id(),
        timeframe = ?req.timeframe,
        samples = samples.len(),
        meals = meals.len(),
        include_ai = req.include_ai,
        "Analytics generated"
    );

    Ok(Json(ApiResponse::ok(AnalyticsData {
        weight_analytics: report.weight_analytics,
        calorie_analytics: report.calorie_analytics,
        goal_progress: report.goal_progress,
        ai_insights,
        recommendations,
    })))
}
