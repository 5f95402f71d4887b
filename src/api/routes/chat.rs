//! Chat Routes
//!
//! - POST /api/v1/chat - Ask the nutrition assistant a question

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::auth::AuthUser;
use crate::api::dto::{ApiResponse, ChatRequest, ChatResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::cache::RateDecision;

const MAX_MESSAGE_CHARS: usize = 2000;

/// POST /api/v1/chat
///
/// Rate limited per user before any other work.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ApiResponse<ChatResponse>>> {
    let remaining = match state.chat_limiter.check(user.id()).await {
        RateDecision::Allowed { remaining } => remaining,
        RateDecision::Limited { retry_after } => return Err(ApiError::RateLimited { retry_after }),
    };

    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation("message cannot be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::Validation(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let profile = state
        .load_profile(user.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("profile".to_string()))?;

    let reply = state.insight_engine.chat(&profile, message).await;

    Ok(Json(ApiResponse::ok(ChatResponse {
        reply: reply.reply,
        source: reply.source,
        remaining,
    })))
}
