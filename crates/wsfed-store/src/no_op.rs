//! No-op relying-party store.

use async_trait::async_trait;
use wsfed_model::RelyingParty;

use crate::error::StoreResult;
use crate::store::RelyingPartyStore;

/// A store that knows no relying parties.
///
/// Hosts that serve every realm from plugin defaults plug this in; every
/// lookup succeeds with `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRelyingPartyStore;

#[async_trait]
impl RelyingPartyStore for NoOpRelyingPartyStore {
    async fn find_relying_party_by_realm(
        &self,
        _realm: &str,
    ) -> StoreResult<Option<RelyingParty>> {
        Ok(None)
    }
}
