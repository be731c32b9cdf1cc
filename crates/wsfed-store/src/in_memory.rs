//! In-memory relying-party store.

use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;
use wsfed_model::RelyingParty;

use crate::error::{StoreError, StoreResult};
use crate::store::RelyingPartyStore;

/// A store seeded with a fixed set of relying parties at startup.
///
/// Construction validates the seed: duplicate realms and duplicate
/// claim-mapping sources fail fast instead of surfacing as undefined
/// lookup behavior later.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRelyingPartyStore {
    relying_parties: HashMap<String, RelyingParty>,
}

impl InMemoryRelyingPartyStore {
    /// Builds a store from the given relying parties.
    pub fn new(relying_parties: impl IntoIterator<Item = RelyingParty>) -> StoreResult<Self> {
        let mut map = HashMap::new();
        for relying_party in relying_parties {
            let mut sources = HashSet::new();
            for (from, _) in &relying_party.claim_mapping {
                if !sources.insert(from.clone()) {
                    return Err(StoreError::DuplicateMappingSource {
                        realm: relying_party.realm.clone(),
                        source: from.clone(),
                    });
                }
            }
            let realm = relying_party.realm.clone();
            if map.insert(realm.clone(), relying_party).is_some() {
                return Err(StoreError::DuplicateRealm(realm));
            }
        }
        debug!(count = map.len(), "seeded in-memory relying party store");
        Ok(Self {
            relying_parties: map,
        })
    }

    /// Number of seeded relying parties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relying_parties.len()
    }

    /// True when no relying parties are seeded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relying_parties.is_empty()
    }
}

#[async_trait]
impl RelyingPartyStore for InMemoryRelyingPartyStore {
    async fn find_relying_party_by_realm(
        &self,
        realm: &str,
    ) -> StoreResult<Option<RelyingParty>> {
        Ok(self.relying_parties.get(realm).cloned())
    }
}
