//! Profile Cache
//!
//! Short-lived copy of user profiles keyed by user id, so analytics and chat
//! requests do not hit SQLite for every call.
//!
//! - Entries expire after a fixed TTL (5 minutes by default)
//! - At capacity the least recently used profile is evicted
//! - Every profile write must call [`ProfileCache::invalidate`]
//!
//! Reads that miss go to the store and then fill the cache. A write can land
//! between those two steps, so fills carry the [`ProfileCache::generation`]
//! observed before the store read and are dropped if any invalidation
//! happened in between.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::storage::UserProfile;

/// Configuration for the profile cache
#[derive(Debug, Clone)]
pub struct ProfileCacheConfig {
    /// How long an entry stays valid
    pub ttl: Duration,
    /// Maximum number of cached profiles
    pub max_entries: usize,
}

impl Default for ProfileCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    profile: UserProfile,
    expires_at: Instant,
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    generation: u64,
}

/// TTL cache of user profiles with LRU eviction
pub struct ProfileCache {
    state: RwLock<CacheState>,
    ttl: Duration,
}

impl ProfileCache {
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
        Some(n) => n,
        None => unreachable!(),
    };

    pub fn new(config: ProfileCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);

        Self {
            state: RwLock::new(CacheState {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
            ttl: config.ttl,
        }
    }

    /// Cached profile, if present and not expired
    pub async fn get(&self, user_id: &str) -> Option<UserProfile> {
        self.get_at(user_id, Instant::now()).await
    }

    async fn get_at(&self, user_id: &str, now: Instant) -> Option<UserProfile> {
        let mut state = self.state.write().await;

        let expired = match state.entries.get(user_id) {
            Some(entry) if now < entry.expires_at => return Some(entry.profile.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.pop(user_id);
            tracing::trace!(user_id = %user_id, "Profile cache entry expired");
        }
        None
    }

    /// Invalidation counter to capture before reading a profile from the store
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Cache a profile read at `observed` generation.
    ///
    /// Returns `false` and leaves the cache untouched when a profile was
    /// invalidated after `observed` was taken.
    pub async fn insert(&self, profile: UserProfile, observed: u64) -> bool {
        self.insert_at(profile, observed, Instant::now()).await
    }

    async fn insert_at(&self, profile: UserProfile, observed: u64, now: Instant) -> bool {
        let mut state = self.state.write().await;

        if state.generation != observed {
            tracing::trace!(
                user_id = %profile.user_id,
                observed,
                current = state.generation,
                "Skipping stale profile cache fill"
            );
            return false;
        }

        let key = profile.user_id.clone();
        let entry = CacheEntry {
            profile,
            expires_at: now + self.ttl,
        };
        if let Some((evicted, _)) = state.entries.push(key.clone(), entry) {
            if evicted != key {
                tracing::trace!(user_id = %evicted, "Profile cache entry evicted");
            }
        }
        true
    }

    /// Drop the entry for `user_id` and reject fills read before this call
    pub async fn invalidate(&self, user_id: &str) {
        let mut state = self.state.write().await;
        state.generation = state.generation.wrapping_add(1);
        if state.entries.pop(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Profile cache invalidated");
        }
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now()).await
    }

    async fn evict_expired_at(&self, now: Instant) -> usize {
        let mut state = self.state.write().await;

        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, e)| now >= e.expires_at)
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired {
            state.entries.pop(key);
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new(ProfileCacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::GoalType;

    fn profile(id: &str) -> UserProfile {
        UserProfile::new(id, 80.0, 75.0, GoalType::WeightLoss)
    }

    fn small_cache(max_entries: usize) -> ProfileCache {
        ProfileCache::new(ProfileCacheConfig {
            ttl: Duration::from_secs(300),
            max_entries,
        })
    }

    #[tokio::test]
    async fn test_get_after_insert() {
        let cache = ProfileCache::default();
        assert!(cache.get("alice").await.is_none());

        let generation = cache.generation().await;
        assert!(cache.insert(profile("alice"), generation).await);
        let cached = cache.get("alice").await.unwrap();
        assert_eq!(cached.user_id, "alice");
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = small_cache(10);
        let start = Instant::now();
        cache.insert_at(profile("alice"), 0, start).await;

        assert!(cache.get_at("alice", start + Duration::from_secs(299)).await.is_some());
        assert!(cache.get_at("alice", start + Duration::from_secs(300)).await.is_none());
        // Expired entries are removed on read
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = ProfileCache::default();
        cache.insert(profile("alice"), 0).await;
        cache.insert(profile("bob"), 0).await;

        cache.invalidate("alice").await;
        assert!(cache.get("alice").await.is_none());
        assert!(cache.get("bob").await.is_some());
    }

    #[tokio::test]
    async fn test_fill_after_invalidate_is_rejected() {
        let cache = ProfileCache::default();

        // Reader captures the generation, then a writer invalidates
        let observed = cache.generation().await;
        cache.invalidate("alice").await;

        assert!(!cache.insert(profile("alice"), observed).await);
        assert!(cache.get("alice").await.is_none());

        let fresh = cache.generation().await;
        assert!(cache.insert(profile("alice"), fresh).await);
        assert!(cache.get("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = small_cache(2);
        let start = Instant::now();
        cache.insert_at(profile("a"), 0, start).await;
        cache.insert_at(profile("b"), 0, start).await;

        // Touch "a" so "b" becomes the eviction candidate
        assert!(cache.get_at("a", start).await.is_some());
        cache.insert_at(profile("c"), 0, start).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get_at("a", start).await.is_some());
        assert!(cache.get_at("b", start).await.is_none());
        assert!(cache.get_at("c", start).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_falls_back_to_default() {
        let cache = small_cache(0);
        assert!(cache.insert(profile("alice"), 0).await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_expired() {
        let cache = ProfileCache::new(ProfileCacheConfig {
            ttl: Duration::from_secs(60),
            max_entries: 10,
        });
        let start = Instant::now();
        cache.insert_at(profile("old"), 0, start).await;
        cache.insert_at(profile("new"), 0, start + Duration::from_secs(50)).await;

        let dropped = cache.evict_expired_at(start + Duration::from_secs(70)).await;
        assert_eq!(dropped, 1);
        assert_eq!(cache.len().await, 1);
    }
}
