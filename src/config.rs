//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{ProfileCacheConfig, RateLimitConfig};
use crate::insights::LlmConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("platewise").join("platewise.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./platewise_data/platewise.db".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl StorageConfig {
    /// Database path with a leading `~/` expanded to the home directory
    pub fn resolved_path(&self) -> PathBuf {
        match (self.database_path.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.database_path),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// LLM service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// Prefer `PLATEWISE_LLM_API_KEY` over writing the key to disk
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    15_000
}

fn default_llm_max_tokens() -> u32 {
    600
}

fn default_llm_temperature() -> f32 {
    0.4
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_llm_url(),
            api_key: None,
            model: default_llm_model(),
            request_timeout_ms: default_llm_timeout(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
        }
    }
}

/// Profile cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_profile_ttl")]
    pub profile_ttl_secs: u64,

    #[serde(default = "default_max_profiles")]
    pub max_profiles: usize,
}

fn default_profile_ttl() -> u64 {
    300
}

fn default_max_profiles() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            profile_ttl_secs: default_profile_ttl(),
            max_profiles: default_max_profiles(),
        }
    }
}

/// Chat rate limit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_chat_max_requests")]
    pub chat_max_requests: u32,

    #[serde(default = "default_chat_window")]
    pub chat_window_secs: u64,
}

fn default_chat_max_requests() -> u32 {
    10
}

fn default_chat_window() -> u64 {
    60
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            chat_max_requests: default_chat_max_requests(),
            chat_window_secs: default_chat_window(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("platewise={},tower_http=info", self.level))
        });

        let registry = tracing_subscriber::registry().with(filter);
        if self.format.eq_ignore_ascii_case("json") {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("cache.profile_ttl_secs", self.cache.profile_ttl_secs),
            ("rate_limit.chat_window_secs", self.rate_limit.chat_window_secs),
            ("api.request_timeout_secs", self.api.request_timeout_secs),
        ];

        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1 second".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("platewise").join("config.toml")),
            Some(PathBuf::from("/etc/platewise/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(path) = var("PLATEWISE_DATABASE_PATH") {
            self.storage.database_path = path;
        }

        // API overrides
        if let Some(host) = var("PLATEWISE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("PLATEWISE_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // LLM overrides
        if let Some(enabled) = var("PLATEWISE_LLM_ENABLED") {
            self.llm.enabled = enabled.eq_ignore_ascii_case("true") || enabled == "1";
        }
        if let Some(url) = var("PLATEWISE_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(key) = var("PLATEWISE_LLM_API_KEY").filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = var("PLATEWISE_LLM_MODEL") {
            self.llm.model = model;
        }

        // Rate limit overrides
        if let Some(max) = var("PLATEWISE_CHAT_RATE_LIMIT").and_then(|m| m.parse().ok()) {
            self.rate_limit.chat_max_requests = max;
        }

        // Logging overrides
        if let Some(level) = var("PLATEWISE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("PLATEWISE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Server settings for the API layer
    pub fn api_config(&self) -> crate::api::ApiConfig {
        crate::api::ApiConfig {
            host: self.api.host.clone(),
            port: self.api.port,
            request_timeout_ms: self.api.request_timeout_secs * 1000,
            max_body_size: self.api.max_body_bytes,
        }
    }

    pub fn profile_cache_config(&self) -> ProfileCacheConfig {
        ProfileCacheConfig {
            ttl: Duration::from_secs(self.cache.profile_ttl_secs),
            max_entries: self.cache.max_profiles,
        }
    }

    pub fn chat_rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit.chat_max_requests,
            window: Duration::from_secs(self.rate_limit.chat_window_secs),
            ..Default::default()
        }
    }

    /// LLM client settings, or `None` when the LLM is disabled
    pub fn llm_config(&self) -> Option<LlmConfig> {
        if !self.llm.enabled {
            return None;
        }
        Some(LlmConfig {
            base_url: self.llm.base_url.clone(),
            api_key: self.llm.api_key.clone(),
            model: self.llm.model.clone(),
            request_timeout_ms: self.llm.request_timeout_ms,
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Platewise Configuration
#
# Environment variables override these settings:
# - PLATEWISE_DATABASE_PATH
# - PLATEWISE_API_HOST
# - PLATEWISE_API_PORT
# - PLATEWISE_LLM_ENABLED
# - PLATEWISE_LLM_BASE_URL
# - PLATEWISE_LLM_API_KEY
# - PLATEWISE_LLM_MODEL
# - PLATEWISE_CHAT_RATE_LIMIT
# - PLATEWISE_LOG_LEVEL
# - PLATEWISE_LOG_FORMAT

[storage]
# SQLite database file
database_path = "~/.local/share/platewise/platewise.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Request timeout in seconds
request_timeout_secs = 30

# Maximum request body size (bytes)
max_body_bytes = 1048576

[llm]
# Enable AI insights; without it every AI field uses rule-based responses
enabled = false

# OpenAI-compatible API base URL
base_url = "https://api.openai.com/v1"

# Model name
model = "gpt-4o-mini"

# Per-request timeout (ms); requests are never retried
request_timeout_ms = 15000

max_tokens = 600
temperature = 0.4

[cache]
# How long a cached profile stays valid (seconds)
profile_ttl_secs = 300

# Maximum number of cached profiles
max_profiles = 10000

[rate_limit]
# Chat messages allowed per user per window
chat_max_requests = 10
chat_window_secs = 60

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8090);
        assert!(!config.llm.enabled);
        assert_eq!(config.cache.profile_ttl_secs, 300);
        assert_eq!(config.rate_limit.chat_max_requests, 10);
        assert!(config.llm_config().is_none());
    }

    #[test]
    fn test_default_template_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.rate_limit.chat_window_secs, 60);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[llm]\nenabled = true\nmodel = \"llama3\"\n\n[cache]\nprofile_ttl_secs = 60\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.profile_cache_config().ttl, Duration::from_secs(60));

        let llm = config.llm_config().unwrap();
        assert_eq!(llm.model, "llama3");
        assert_eq!(llm.request_timeout_ms, 15_000);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[api\nport = ").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[cache]\nprofile_ttl_secs = 0\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Invalid { field: "cache.profile_ttl_secs", .. })
        ));

        std::fs::write(&path, "[rate_limit]\nchat_window_secs = 0\n").unwrap();
        assert!(matches!(
            Config::load_with_env(&path),
            Err(ConfigError::Invalid { field: "rate_limit.chat_window_secs", .. })
        ));

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PLATEWISE_API_PORT", "9100"),
            ("PLATEWISE_LLM_ENABLED", "1"),
            ("PLATEWISE_LLM_API_KEY", "sk-test"),
            ("PLATEWISE_CHAT_RATE_LIMIT", "3"),
            ("PLATEWISE_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_config().addr(), "0.0.0.0:9100");
        assert_eq!(config.llm_config().unwrap().api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.chat_rate_limit().max_requests, 3);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_resolved_path() {
        let storage = StorageConfig {
            database_path: "/tmp/platewise.db".to_string(),
        };
        assert_eq!(storage.resolved_path(), PathBuf::from("/tmp/platewise.db"));

        let storage = StorageConfig {
            database_path: "~/data/platewise.db".to_string(),
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(storage.resolved_path(), home.join("data/platewise.db"));
        }
    }

    #[test]
    fn test_bad_port_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "PLATEWISE_API_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.api.port, 8090);
    }
}
