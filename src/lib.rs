//! # Platewise
//!
//! Nutrition tracking backend - stores meals and weight history and turns
//! them into weight-trend, calorie-adherence and goal-progress analytics.
//!
//! ## Features
//!
//! - **Weight trends**: weekly/monthly kg-per-week trends, goal progress, regression line
//! - **Calorie analytics**: daily totals, ±10% adherence, macro averages, best/worst day
//! - **Goal synthesis**: expected vs actual progress, status and success probability
//! - **AI insights**: optional LLM narrative with rule-based fallback
//!
//! ## Modules
//!
//! - [`analytics`]: Pure analytics pipeline and the nutrition plan calculator
//! - [`storage`]: SQLite persistence and domain types
//! - [`cache`]: Profile cache and chat rate limiter
//! - [`insights`]: LLM client and insight engine
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use platewise::analytics;
//! use platewise::storage::*;
//! use chrono::{Duration, Utc};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = NutritionStore::open_in_memory()?;
//!     let profile = UserProfile::new("alice", 80.0, 70.0, GoalType::WeightLoss);
//!     store.upsert_profile(&profile)?;
//!
//!     let now = Utc::now();
//!     store.log_weight("alice", &WeightSample::new(80.0, now - Duration::days(6)))?;
//!     store.log_weight("alice", &WeightSample::new(79.0, now))?;
//!
//!     let since = Timeframe::OneMonth.since(now);
//!     let samples = store.weight_samples("alice", since)?;
//!     let meals = store.meals("alice", since)?;
//!     let report = analytics::analyze(&profile, &samples, &meals, now)?;
//!
//!     println!("Progress: {:.0}%", report.weight_analytics.progress_percentage);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod insights;
pub mod storage;

// Re-export top-level types for convenience
pub use analytics::{
    analyze, AnalyticsError, AnalyticsReport, CalorieAnalytics, GoalProgress, GoalStatus,
    NutritionPlan, PlanError, PlanInput, TrendDirection, WeightAnalytics,
};

pub use storage::{
    GoalType, MealRecord, Measurement, NutritionStore, StorageError, StorageResult, Timeframe,
    Unit, UserProfile, WeightSample,
};

pub use cache::{ProfileCache, ProfileCacheConfig, RateDecision, RateLimitConfig, RateLimiter};

pub use insights::{
    AiInsights, FoodRecommendation, InsightEngine, InsightProvider, InsightSource, LlmClient,
    LlmConfig, LlmError,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};
