//! Platewise API Server
//!
//! Run with: cargo run --bin platewise
//!
//! # Configuration
//!
//! Read from the first of `$XDG_CONFIG_HOME/platewise/config.toml`,
//! `/etc/platewise/config.toml` and `./config.toml`, then overridden by
//! `PLATEWISE_*` environment variables. `RUST_LOG` overrides the log level.

use anyhow::Context;
use platewise::api::{serve, AppState};
use platewise::config::Config;
use platewise::insights::{InsightEngine, LlmClient};
use platewise::storage::NutritionStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    config.logging.init_tracing();
    config.validate().context("invalid configuration")?;

    tracing::info!("Starting Platewise API server v{}", env!("CARGO_PKG_VERSION"));

    // Open the database
    let db_path = config.storage.resolved_path();
    tracing::info!("Database: {:?}", db_path);
    let store = Arc::new(
        NutritionStore::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?,
    );
    match store.stats() {
        Ok(stats) => tracing::info!("Storage stats: {}", stats),
        Err(e) => tracing::warn!("Could not read storage stats: {}", e),
    }

    // Insight engine (LLM optional)
    let insight_engine = match config.llm_config() {
        Some(llm_config) => {
            tracing::info!(
                "LLM insights enabled: {} ({})",
                llm_config.base_url,
                llm_config.model
            );
            let client = LlmClient::new(llm_config).context("failed to build LLM client")?;
            InsightEngine::new(Arc::new(client))
        }
        None => {
            tracing::info!("LLM insights disabled, using rule-based responses");
            InsightEngine::disabled()
        }
    };

    let api_config = config.api_config();
    let state = AppState::with_components(
        store,
        api_config.clone(),
        config.profile_cache_config(),
        config.chat_rate_limit(),
        insight_engine,
    );

    // Sweep expired profile cache entries in the background
    let cache = Arc::clone(&state.profile_cache);
    let sweep_every = config.profile_cache_config().ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let dropped = cache.evict_expired().await;
            if dropped > 0 {
                tracing::debug!(dropped, "Swept expired profile cache entries");
            }
        }
    });

    serve(state, &api_config).await?;

    tracing::info!("Platewise API server stopped");
    Ok(())
}
