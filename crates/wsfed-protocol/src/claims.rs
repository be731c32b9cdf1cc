//! Claim retrieval and outbound claim-type mapping.
//!
//! Hosts store claims under short OIDC-style types (`email`, `name`).
//! Relying parties built on WIF expect the long SOAP identity URIs, so
//! each claim is rewritten through the configured mapping before it goes
//! into a token. The original type survives as a `ShortTypeName` claim
//! property for relying parties that want it back.

use std::sync::Arc;

use tracing::warn;

use wsfed_model::claim::{claim_properties, Claim};
use wsfed_model::{AuthenticatedSubject, FederationClient, TokenType};

use crate::endpoints::state::FederationHostProvider;
use crate::error::WsFederationResult;

/// Fetches subject claims from the host profile service.
pub struct ClaimsService<P> {
    provider: Arc<P>,
}

impl<P: FederationHostProvider> ClaimsService<P> {
    /// Creates a service over the host provider.
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Loads the subject's profile claims for the requested claim types.
    ///
    /// Straight passthrough to the host. Anything the host does not
    /// return simply stays out of the token.
    pub async fn get_claims(
        &self,
        subject: &AuthenticatedSubject,
        client: &FederationClient,
        claim_types: &[String],
    ) -> WsFederationResult<Vec<Claim>> {
        Ok(self
            .provider
            .issue_profile_claims(subject, client, claim_types)
            .await?)
    }
}

/// Rewrites claim types through the outbound mapping.
///
/// Mapped claims keep their value and properties and gain a
/// `ShortTypeName` property holding the pre-mapping type. Unmapped
/// claims pass through unchanged, except for SAML 1.1 tokens: a SAML 1.1
/// attribute name is split at the last `/` into namespace and name, so a
/// type without a URI path cannot be represented and is dropped.
#[must_use]
pub fn map_claims(
    mapping: &[(String, String)],
    token_type: TokenType,
    claims: Vec<Claim>,
) -> Vec<Claim> {
    let mut mapped = Vec::with_capacity(claims.len());
    for claim in claims {
        let target = mapping
            .iter()
            .find(|(source, _)| *source == claim.claim_type)
            .map(|(_, target)| target);
        match target {
            Some(target) => {
                let short_type = claim.claim_type;
                let mut rewritten = Claim::new(target.clone(), claim.value);
                rewritten.value_type = claim.value_type;
                rewritten.properties = claim.properties;
                rewritten = rewritten
                    .with_property(claim_properties::SHORT_TYPE_NAME, short_type);
                mapped.push(rewritten);
            }
            None if token_type == TokenType::Saml11 && !is_uri_with_path(&claim.claim_type) => {
                warn!(
                    claim_type = %claim.claim_type,
                    "dropping claim that cannot become a SAML 1.1 attribute"
                );
            }
            None => mapped.push(claim),
        }
    }
    mapped
}

/// A SAML 1.1 attribute name needs a namespace/name split at the last
/// `/`, with a scheme in front and a non-empty name behind it.
fn is_uri_with_path(claim_type: &str) -> bool {
    if claim_type.ends_with('/') {
        return false;
    }
    match claim_type.rfind('/') {
        Some(index) => claim_type[..index].contains(':'),
        None => false,
    }
}
