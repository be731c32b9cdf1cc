//! Cache backends for relying-party lookups.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use wsfed_model::RelyingParty;

use crate::error::StoreResult;

/// A cached lookup result. `None` records a confirmed miss so that
/// unknown realms do not hammer the backing store.
pub type CachedLookup = Option<RelyingParty>;

/// Cache backend contract for [`CachingRelyingPartyStore`].
///
/// The outer `Option` of `get` distinguishes "nothing cached" from a
/// cached miss. Implementations own expiry; `get` must never return a
/// stale entry.
///
/// [`CachingRelyingPartyStore`]: crate::caching::CachingRelyingPartyStore
#[async_trait]
pub trait RelyingPartyCache: Send + Sync {
    /// Returns the cached lookup for a realm, if one is still live.
    async fn get(&self, realm: &str) -> StoreResult<Option<CachedLookup>>;

    /// Caches a lookup result for a realm.
    async fn set(&self, realm: &str, lookup: CachedLookup, ttl: Duration) -> StoreResult<()>;
}

struct CacheEntry {
    lookup: CachedLookup,
    expires_at: Instant,
}

/// In-process cache with per-entry TTL and lazy expiry.
#[derive(Default)]
pub struct MemoryRelyingPartyCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryRelyingPartyCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelyingPartyCache for MemoryRelyingPartyCache {
    async fn get(&self, realm: &str) -> StoreResult<Option<CachedLookup>> {
        {
            let entries = self.entries.read().await;
            match entries.get(realm) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.lookup.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired; drop the entry under the write lock.
        self.entries.write().await.remove(realm);
        Ok(None)
    }

    async fn set(&self, realm: &str, lookup: CachedLookup, ttl: Duration) -> StoreResult<()> {
        let entry = CacheEntry {
            lookup,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(realm.to_string(), entry);
        Ok(())
    }
}
