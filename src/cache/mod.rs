//! Shared request-scoped state
//!
//! Both components are owned by `AppState` and injected into handlers;
//! neither is a global. Each guards its map with a single async lock held
//! only for the map operation.

mod profile_cache;
mod rate_limit;

pub use profile_cache::{ProfileCache, ProfileCacheConfig};
pub use rate_limit::{RateDecision, RateLimitConfig, RateLimiter};
