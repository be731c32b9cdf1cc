//! The relying-party store contract.

use async_trait::async_trait;
use wsfed_model::RelyingParty;

use crate::error::StoreResult;

/// Read access to per-relying-party settings.
///
/// `Ok(None)` means the realm has no override record and is served from
/// plugin defaults. Lookup failures are store errors, not absences.
#[async_trait]
pub trait RelyingPartyStore: Send + Sync {
    /// Finds the relying party registered for a realm.
    async fn find_relying_party_by_realm(&self, realm: &str)
    -> StoreResult<Option<RelyingParty>>;
}
