//! Weight Routes
//!
//! - POST /api/v1/weights - Log a weigh-in
//! - GET /api/v1/weights?timeframe=1M - Weigh-ins in a window

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::auth::AuthUser;
use crate::api::dto::{
    body_weight, ApiResponse, LogWeightRequest, TimeframeQuery, WeightEntry, WeightHistory,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::WeightSample;

/// POST /api/v1/weights
///
/// Also sets the profile's current weight, when a profile exists.
pub async fn log_weight(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<LogWeightRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<WeightEntry>>)> {
    let weight = body_weight(&req.weight).map_err(ApiError::Validation)?;
    let now = Utc::now();
    let recorded_at = req.recorded_at.unwrap_or(now);
    if recorded_at > now + chrono::Duration::minutes(5) {
        return Err(ApiError::Validation("recordedAt is in the future".to_string()));
    }

    let sample = WeightSample::new(weight, recorded_at);
    let (id, profile_updated) = state.store.record_weight(user.id(), &sample)?;
    if profile_updated {
        state.profile_cache.invalidate(user.id()).await;
    }

    tracing::info!(user_id = %user.id(), id, weight, "Weight logged");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(WeightEntry {
            id,
            weight,
            recorded_at,
        })),
    ))
}

/// GET /api/v1/weights
pub async fn list_weights(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<TimeframeQuery>,
) -> ApiResult<Json<ApiResponse<WeightHistory>>> {
    let since = query.timeframe.since(Utc::now());
    let samples = state.store.weight_samples(user.id(), since)?;

    Ok(Json(ApiResponse::ok(WeightHistory {
        timeframe: query.timeframe,
        samples,
    })))
}
