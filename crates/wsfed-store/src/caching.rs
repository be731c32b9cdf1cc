//! Read-through caching decorator for relying-party stores.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;
use wsfed_model::RelyingParty;

use crate::cache::RelyingPartyCache;
use crate::error::StoreResult;
use crate::store::RelyingPartyStore;

/// Wraps a [`RelyingPartyStore`] with a read-through cache.
///
/// Both found records and confirmed misses are cached for the configured
/// TTL, so a realm probing attack cannot force a backend lookup per
/// request. The decorator composes: any store can be wrapped, including
/// another decorator.
pub struct CachingRelyingPartyStore<S> {
    inner: S,
    cache: Arc<dyn RelyingPartyCache>,
    ttl: Duration,
}

impl<S> CachingRelyingPartyStore<S> {
    /// Wraps `inner` with the given cache backend and entry TTL.
    pub fn new(inner: S, cache: Arc<dyn RelyingPartyCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<S: RelyingPartyStore> RelyingPartyStore for CachingRelyingPartyStore<S> {
    async fn find_relying_party_by_realm(
        &self,
        realm: &str,
    ) -> StoreResult<Option<RelyingParty>> {
        if let Some(cached) = self.cache.get(realm).await? {
            trace!(realm, hit = cached.is_some(), "relying party cache hit");
            return Ok(cached);
        }

        let fresh = self.inner.find_relying_party_by_realm(realm).await?;
        self.cache.set(realm, fresh.clone(), self.ttl).await?;
        trace!(realm, found = fresh.is_some(), "relying party cache fill");
        Ok(fresh)
    }
}
