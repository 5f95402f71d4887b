//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::cache::{ProfileCache, ProfileCacheConfig, RateLimitConfig, RateLimiter};
use crate::insights::InsightEngine;
use crate::storage::{NutritionStore, StorageResult, UserProfile};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// SQLite store for profiles, weights and meals
    pub store: Arc<NutritionStore>,
    /// Short-lived profile copies, invalidated on every profile write
    pub profile_cache: Arc<ProfileCache>,
    /// Per-user limiter for the chat endpoint
    pub chat_limiter: Arc<RateLimiter>,
    /// LLM-backed insights with rule-based fallback
    pub insight_engine: Arc<InsightEngine>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state with default cache and limiter settings and no LLM
    pub fn new(store: Arc<NutritionStore>, config: ApiConfig) -> Self {
        Self::with_components(
            store,
            config,
            ProfileCacheConfig::default(),
            RateLimitConfig::default(),
            InsightEngine::disabled(),
        )
    }

    /// Create state with explicit component configuration
    pub fn with_components(
        store: Arc<NutritionStore>,
        config: ApiConfig,
        cache_config: ProfileCacheConfig,
        rate_limit: RateLimitConfig,
        insight_engine: InsightEngine,
    ) -> Self {
        Self {
            store,
            profile_cache: Arc::new(ProfileCache::new(cache_config)),
            chat_limiter: Arc::new(RateLimiter::new(rate_limit)),
            insight_engine: Arc::new(insight_engine),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Profile for `user_id`, served from the cache when fresh
    pub async fn load_profile(&self, user_id: &str) -> StorageResult<Option<UserProfile>> {
        if let Some(profile) = self.profile_cache.get(user_id).await {
            return Ok(Some(profile));
        }

        let generation = self.profile_cache.generation().await;
        let profile = self.store.get_profile(user_id)?;
        if let Some(profile) = &profile {
            self.profile_cache.insert(profile.clone(), generation).await;
        }
        Ok(profile)
    }

    /// Persist a profile and drop its cached copy
    pub async fn save_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        self.store.upsert_profile(profile)?;
        self.profile_cache.invalidate(&profile.user_id).await;
        Ok(())
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            request_timeout_ms: 30_000,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::GoalType;

    #[test]
    fn test_addr() {
        assert_eq!(ApiConfig::new("127.0.0.1", 9000).addr(), "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_save_invalidates_cache() {
        let store = Arc::new(NutritionStore::open_in_memory().unwrap());
        let state = AppState::new(store, ApiConfig::default());

        let profile = UserProfile::new("u1", 80.0, 70.0, GoalType::WeightLoss);
        state.save_profile(&profile).await.unwrap();

        let loaded = state.load_profile("u1").await.unwrap().unwrap();
        assert_eq!(loaded.target_weight, 70.0);
        assert_eq!(state.profile_cache.len().await, 1);

        let mut updated = loaded;
        updated.target_weight = 68.0;
        state.save_profile(&updated).await.unwrap();
        assert!(state.profile_cache.is_empty().await);

        let reloaded = state.load_profile("u1").await.unwrap().unwrap();
        assert_eq!(reloaded.target_weight, 68.0);
    }

    #[tokio::test]
    async fn test_write_during_fill_is_not_overwritten() {
        let store = Arc::new(NutritionStore::open_in_memory().unwrap());
        let state = AppState::new(Arc::clone(&store), ApiConfig::default());
        state
            .save_profile(&UserProfile::new("u1", 80.0, 70.0, GoalType::WeightLoss))
            .await
            .unwrap();

        // A reader misses the cache and reads the old row...
        let observed = state.profile_cache.generation().await;
        let stale = store.get_profile("u1").unwrap().unwrap();

        // ...a writer saves before the reader fills the cache
        let mut updated = stale.clone();
        updated.target_weight = 65.0;
        state.save_profile(&updated).await.unwrap();

        assert!(!state.profile_cache.insert(stale, observed).await);
        let loaded = state.load_profile("u1").await.unwrap().unwrap();
        assert_eq!(loaded.target_weight, 65.0);
    }

    #[tokio::test]
    async fn test_missing_profile_not_cached() {
        let store = Arc::new(NutritionStore::open_in_memory().unwrap());
        let state = AppState::new(store, ApiConfig::default());
        assert!(state.load_profile("ghost").await.unwrap().is_none());
        assert!(state.profile_cache.is_empty().await);
    }
}
