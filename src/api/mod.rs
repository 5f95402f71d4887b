//! Platewise REST API
//!
//! HTTP API layer for Platewise, built with Axum. Every `/api/v1` route
//! expects the caller's id in the `X-User-Id` header.
//!
//! # Endpoints
//!
//! ## Analytics
//! - `POST /api/v1/analytics` - Weight, calorie and goal analytics
//!
//! ## Profile
//! - `GET /api/v1/profile` - Get the profile
//! - `PUT /api/v1/profile` - Create or replace the profile
//! - `PATCH /api/v1/profile` - Update one field
//!
//! ## Logging
//! - `POST /api/v1/weights` / `GET /api/v1/weights` - Weigh-ins
//! - `POST /api/v1/meals` / `GET /api/v1/meals` - Meals
//!
//! ## Coaching
//! - `POST /api/v1/plan` - Calorie and macro plan
//! - `POST /api/v1/chat` - Nutrition assistant (rate limited)
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use platewise::api::{serve, ApiConfig, AppState};
//! use platewise::storage::NutritionStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(NutritionStore::open("platewise.db")?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::AuthUser;
pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;
    let request_timeout = Duration::from_millis(state.config.request_timeout_ms);

    let api_routes = Router::new()
        .route("/analytics", post(routes::analytics::get_analytics))
        .route(
            "/profile",
            get(routes::profile::get_profile)
                .put(routes::profile::put_profile)
                .patch(routes::profile::patch_profile),
        )
        .route(
            "/weights",
            get(routes::weights::list_weights).post(routes::weights::log_weight),
        )
        .route(
            "/meals",
            get(routes::meals::list_meals).post(routes::meals::log_meal),
        )
        .route("/plan", post(routes::plan::create_plan))
        .route("/chat", post(routes::chat::chat))
        .layer(DefaultBodyLimit::max(body_limit));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Platewise API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Platewise API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ProfileCacheConfig, RateLimitConfig};
    use crate::insights::InsightEngine;
    use crate::storage::NutritionStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    const USER: &str = "user-1";

    fn create_test_app_with_limit(max_chat: u32) -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(NutritionStore::open(dir.path().join("test.db")).unwrap());

        let state = AppState::with_components(
            store,
            ApiConfig::default(),
            ProfileCacheConfig::default(),
            RateLimitConfig {
                max_requests: max_chat,
                ..Default::default()
            },
            InsightEngine::disabled(),
        );
        let router = build_router(state);

        (router, dir)
    }

    fn create_test_app() -> (Router, tempfile::TempDir) {
        create_test_app_with_limit(10)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("X-User-Id", user);
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create_profile(app: &Router) {
        let (status, _) = send(
            app,
            "PUT",
            "/api/v1/profile",
            Some(USER),
            Some(json!({
                "currentWeight": {"value": 80, "unit": "kg"},
                "targetWeight": {"value": 70, "unit": "kg"},
                "goalType": "weight_loss",
                "height": {"value": 180, "unit": "cm"},
                "age": 30,
                "sex": "male",
                "activityLevel": "moderately_active"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _dir) = create_test_app();
        let (status, _) = send(&app, "GET", "/health/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _dir) = create_test_app();
        let (status, _) = send(&app, "GET", "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _dir) = create_test_app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["llm"], "disabled");
        assert_eq!(body["cached_profiles"], 0);
        assert_eq!(body["chat_windows"], 0);
    }

    #[tokio::test]
    async fn test_analytics_requires_user() {
        let (app, _dir) = create_test_app();
        let (status, body) = send(&app, "POST", "/api/v1/analytics", None, Some(json!({}))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_analytics_without_profile() {
        let (app, _dir) = create_test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/analytics",
            Some(USER),
            Some(json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_analytics_flow() {
        let (app, _dir) = create_test_app();
        create_profile(&app).await;

        let now = Utc::now();
        for (weight, days_ago) in [(80.0, 6), (79.0, 3), (78.5, 0)] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/v1/weights",
                Some(USER),
                Some(json!({
                    "weight": {"value": weight, "unit": "kg"},
                    "recordedAt": now - Duration::days(days_ago),
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/meals",
            Some(USER),
            Some(json!({
                "name": "Chicken and rice",
                "mealType": "lunch",
                "totalCalories": 2000,
                "totalProtein": 150,
                "totalCarbs": 200,
                "totalFat": 60,
                "consumedAt": now - Duration::hours(1),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/analytics",
            Some(USER),
            Some(json!({"timeframe": "1W"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let data = &body["data"];
        assert_eq!(data["weightAnalytics"]["startWeight"], 80.0);
        assert_eq!(data["weightAnalytics"]["currentWeight"], 78.5);
        assert_eq!(data["weightAnalytics"]["trendDirection"], "improving");
        assert_eq!(data["weightAnalytics"]["chartData"]["weights"].as_array().unwrap().len(), 3);
        assert_eq!(data["calorieAnalytics"]["daysLogged"], 1);
        assert!(data["goalProgress"]["primaryGoal"].as_str().unwrap().contains("Lose"));
        assert!(data["aiInsights"].is_null());
        assert!(data["recommendations"].is_null());
    }

    #[tokio::test]
    async fn test_analytics_with_ai_uses_fallback() {
        let (app, _dir) = create_test_app();
        create_profile(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/analytics",
            Some(USER),
            Some(json!({"includeAI": true, "includeFoodRecommendations": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["aiInsights"]["source"], "fallback");
        assert!(!body["data"]["aiInsights"]["summary"].as_str().unwrap().is_empty());
        assert!(!body["data"]["recommendations"]["foods"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logging_weight_updates_profile() {
        let (app, _dir) = create_test_app();
        create_profile(&app).await;

        // Warm the cache so the write must invalidate it
        let (_, before) = send(&app, "GET", "/api/v1/profile", Some(USER), None).await;
        assert_eq!(before["data"]["currentWeight"], 80.0);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/weights",
            Some(USER),
            Some(json!({"weight": {"value": 170, "unit": "lb"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, after) = send(&app, "GET", "/api/v1/profile", Some(USER), None).await;
        let weight = after["data"]["currentWeight"].as_f64().unwrap();
        assert!((weight - 77.110_702_9).abs() < 1e-6);

        let (status, history) = send(
            &app,
            "GET",
            "/api/v1/weights?timeframe=1W",
            Some(USER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["data"]["timeframe"], "1W");
        assert_eq!(history["data"]["samples"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_weight_rejects_length_unit() {
        let (app, _dir) = create_test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/weights",
            Some(USER),
            Some(json!({"weight": {"value": 170, "unit": "cm"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_patch_profile() {
        let (app, _dir) = create_test_app();

        let update = json!({"field": "targetWeight", "value": {"value": 150, "unit": "lb"}});
        let (status, _) = send(
            &app,
            "PATCH",
            "/api/v1/profile",
            Some(USER),
            Some(update.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        create_profile(&app).await;
        let (status, body) = send(&app, "PATCH", "/api/v1/profile", Some(USER), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        let target = body["data"]["targetWeight"].as_f64().unwrap();
        assert!((target - 68.038_855_5).abs() < 1e-6);

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/v1/profile",
            Some(USER),
            Some(json!({"field": "age", "value": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_meal_history_totals() {
        let (app, _dir) = create_test_app();
        let now = Utc::now();

        for calories in [400, 600] {
            send(
                &app,
                "POST",
                "/api/v1/meals",
                Some(USER),
                Some(json!({"totalCalories": calories, "consumedAt": now})),
            )
            .await;
        }

        let (status, body) = send(&app, "GET", "/api/v1/meals", Some(USER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["meals"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["dailyTotals"][0]["calories"], 1000.0);
        assert_eq!(body["data"]["dailyTotals"][0]["mealCount"], 2);
    }

    #[tokio::test]
    async fn test_plan_apply() {
        let (app, _dir) = create_test_app();
        create_profile(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/plan",
            Some(USER),
            Some(json!({"apply": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["applied"], true);
        assert_eq!(body["data"]["plan"]["dailyCalories"], 2259);

        let (_, profile) = send(&app, "GET", "/api/v1/profile", Some(USER), None).await;
        assert_eq!(profile["data"]["dailyCalorieGoal"], 2259);
    }

    #[tokio::test]
    async fn test_plan_invalid_input() {
        let (app, _dir) = create_test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/plan",
            Some(USER),
            Some(json!({"input": {
                "weightKg": 10, "heightCm": 180, "age": 30, "sex": "male",
                "activityLevel": "sedentary", "goalType": "maintenance"
            }})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_rate_limited() {
        let (app, _dir) = create_test_app_with_limit(2);
        create_profile(&app).await;

        let message = json!({"message": "What should I have for dinner?"});
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/chat",
            Some(USER),
            Some(message.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["source"], "fallback");
        assert_eq!(body["data"]["remaining"], 1);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/chat",
            Some(USER),
            Some(message.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/chat",
            Some(USER),
            Some(message.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");

        // Limits are per user
        let (status, _) = send(&app, "POST", "/api/v1/chat", Some("user-2"), Some(message)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, health) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(health["chat_windows"], 2);
    }

    #[tokio::test]
    async fn test_chat_empty_message() {
        let (app, _dir) = create_test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/chat",
            Some(USER),
            Some(json!({"message": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
