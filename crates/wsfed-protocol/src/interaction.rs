//! Login interaction policy.
//!
//! Given a validated request and the current session, decide whether the
//! session is good enough to issue a token or the user must go through
//! login again. The checks run in a strict order and the first hit wins.
//! The passive profile has no consent step; consent is always skipped.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;

use crate::constants::identity_providers;
use crate::endpoints::state::FederationHostProvider;
use crate::error::WsFederationResult;
use crate::validation::ValidatedWsFederationRequest;

/// Outcome of the interaction checks. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResponse {
    /// The session satisfies the relying party; issue the token.
    Proceed,
    /// The user must authenticate (again).
    Login,
    /// Send the browser elsewhere first.
    Redirect(String),
    /// The request cannot continue.
    Error {
        /// Protocol error code.
        error: String,
        /// Human-readable detail.
        error_description: String,
    },
}

impl InteractionResponse {
    /// True when the outcome requires a login round trip.
    #[must_use]
    pub const fn is_login(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// True when token issuance may proceed.
    #[must_use]
    pub const fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Evaluates whether the current session satisfies the request.
pub struct InteractionResponseGenerator<P> {
    provider: Arc<P>,
}

impl<P: FederationHostProvider> InteractionResponseGenerator<P> {
    /// Creates a generator over the host provider.
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Runs the ordered checks for a validated sign-in request.
    pub async fn process(
        &self,
        validated: &ValidatedWsFederationRequest,
    ) -> WsFederationResult<InteractionResponse> {
        if validated.force_fresh_login {
            debug!("wfresh=0 forces login");
            return Ok(InteractionResponse::Login);
        }

        let Some(subject) = validated.subject.as_ref() else {
            debug!("no authenticated subject");
            return Ok(InteractionResponse::Login);
        };

        if !self
            .provider
            .is_subject_active(subject, &validated.client)
            .await?
        {
            debug!(subject_id = %subject.subject_id, "subject inactive");
            return Ok(InteractionResponse::Login);
        }

        if let Some(hint) = validated.home_realm.as_deref()
            && hint != subject.identity_provider
        {
            debug!(hint, current = %subject.identity_provider, "home realm mismatch");
            return Ok(InteractionResponse::Login);
        }

        let now = Utc::now();
        if let Some(minutes) = validated.freshness_minutes
            && now > subject.authentication_time + Duration::minutes(minutes)
        {
            debug!(minutes, "session older than wfresh");
            return Ok(InteractionResponse::Login);
        }

        let is_local = subject.identity_provider == identity_providers::LOCAL;
        if is_local && !validated.client.enable_local_login {
            debug!("client disables local login");
            return Ok(InteractionResponse::Login);
        }

        if !is_local
            && !validated.client.identity_provider_restrictions.is_empty()
            && !validated
                .client
                .identity_provider_restrictions
                .iter()
                .any(|p| p == &subject.identity_provider)
        {
            debug!(provider = %subject.identity_provider, "identity provider not allowed");
            return Ok(InteractionResponse::Login);
        }

        if let Some(max_seconds) = validated.client.user_sso_lifetime
            && (now - subject.authentication_time).num_seconds() > max_seconds
        {
            debug!(max_seconds, "session exceeds client sso lifetime");
            return Ok(InteractionResponse::Login);
        }

        Ok(InteractionResponse::Proceed)
    }
}
