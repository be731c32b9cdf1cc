//! Inbound request validation.
//!
//! The validator turns a raw passive-profile message plus the current
//! session into either a [`ValidatedWsFederationRequest`] or a protocol
//! failure. Failures are data, not errors: only store and host outages
//! surface as `Err`.

pub mod timestamp;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use wsfed_core::WsFederationOptions;
use wsfed_model::{AuthenticatedSubject, FederationClient, ProtocolType, RelyingParty};
use wsfed_store::RelyingPartyStore;

use crate::constants::MAX_WREQPTR_LENGTH;
use crate::endpoints::state::FederationHostProvider;
use crate::error::WsFederationResult;
use crate::message::WsFederationMessage;

/// Protocol error codes carried in failure results.
pub mod error_codes {
    /// Malformed, missing, oversized, or conflicting parameters.
    pub const INVALID_REQUEST: &str = "invalid_request";
    /// Unknown client, wrong protocol type, or no usable reply URL.
    pub const INVALID_RELYING_PARTY: &str = "invalid_relying_party";
}

/// A fully validated inbound request.
///
/// `reply_url`, when present, has passed the host's redirect validation
/// or fallen back to the client's registered default; it is never taken
/// from the wire unchecked. Validation outcomes that older designs
/// recorded by mutating the message (`wct` cleared, `wfresh` stripped,
/// `whr` dropped) are explicit fields here.
#[derive(Debug, Clone)]
pub struct ValidatedWsFederationRequest {
    /// The inbound message, untouched.
    pub message: WsFederationMessage,

    /// The resolved client registration.
    pub client: FederationClient,

    /// Per-relying-party overrides, when a record exists.
    pub relying_party: Option<RelyingParty>,

    /// The authenticated subject, when a session exists.
    pub subject: Option<AuthenticatedSubject>,

    /// Validated response target. Always present for sign-in; optional
    /// for sign-out.
    pub reply_url: Option<String>,

    /// Host session identifier, when a session exists.
    pub session_id: Option<String>,

    /// Clients with active front-channel sessions to notify on sign-out.
    pub signout_client_ids: Vec<String>,

    /// Scopes granted for claims retrieval. Always the client's full
    /// allowed set; there is no per-request scope negotiation in the
    /// passive profile.
    pub scopes: Vec<String>,

    /// `wct` was present, parsed, and within tolerance. Replaying the
    /// message without `wct` keeps this false without failing.
    pub time_checked: bool,

    /// `wfresh=0` demanded a fresh login.
    pub force_fresh_login: bool,

    /// Positive `wfresh` in minutes.
    pub freshness_minutes: Option<i64>,

    /// `whr` hint, kept only when the client's identity-provider
    /// restrictions allow it.
    pub home_realm: Option<String>,
}

/// Outcome of validating an inbound message.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// The request is acceptable.
    Success(ValidatedWsFederationRequest),
    /// The request was rejected with a protocol error.
    Failure {
        /// Protocol error code from [`error_codes`].
        error: String,
        /// Human-readable detail, safe to render.
        error_description: String,
    },
}

impl ValidationResult {
    /// Creates a failure result.
    #[must_use]
    pub fn failure(error: &str, description: impl Into<String>) -> Self {
        Self::Failure {
            error: error.to_string(),
            error_description: description.into(),
        }
    }

    /// True when this result is a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Outcomes of the optional-parameter checks shared by both flows.
struct OptionalParameters {
    time_checked: bool,
    force_fresh_login: bool,
    freshness_minutes: Option<i64>,
    home_realm: Option<String>,
}

/// Validates sign-in and sign-out messages.
pub struct WsFederationRequestValidator<P> {
    provider: Arc<P>,
    relying_parties: Arc<dyn RelyingPartyStore>,
    options: Arc<WsFederationOptions>,
}

impl<P: FederationHostProvider> WsFederationRequestValidator<P> {
    /// Creates a validator over the given host provider and store.
    pub fn new(
        provider: Arc<P>,
        relying_parties: Arc<dyn RelyingPartyStore>,
        options: Arc<WsFederationOptions>,
    ) -> Self {
        Self {
            provider,
            relying_parties,
            options,
        }
    }

    /// Validates a `wsignin1.0` message.
    pub async fn validate_sign_in_request(
        &self,
        message: &WsFederationMessage,
        subject: Option<&AuthenticatedSubject>,
    ) -> WsFederationResult<ValidationResult> {
        let client = match self.resolve_client(message).await? {
            Ok(client) => client,
            Err(failure) => return Ok(failure),
        };

        if let Some(failure) = validate_token_request_payload(message, &self.options) {
            return Ok(failure);
        }

        let reply_url = match self.resolve_sign_in_reply_url(&client, message).await? {
            Ok(url) => url,
            Err(failure) => return Ok(failure),
        };

        let relying_party = self
            .relying_parties
            .find_relying_party_by_realm(&client.client_id)
            .await?;

        let optional = match self.validate_optional_parameters(message, &client) {
            Ok(optional) => optional,
            Err(failure) => return Ok(failure),
        };

        let scopes = client.allowed_scopes.clone();
        Ok(ValidationResult::Success(ValidatedWsFederationRequest {
            message: message.clone(),
            relying_party,
            subject: subject.cloned(),
            reply_url: Some(reply_url),
            session_id: subject.map(|s| s.session_id.clone()),
            signout_client_ids: Vec::new(),
            scopes,
            time_checked: optional.time_checked,
            force_fresh_login: optional.force_fresh_login,
            freshness_minutes: optional.freshness_minutes,
            home_realm: optional.home_realm,
            client,
        }))
    }

    /// Validates a `wsignout1.0` or `wsignoutcleanup1.0` message.
    pub async fn validate_sign_out_request(
        &self,
        message: &WsFederationMessage,
        subject: Option<&AuthenticatedSubject>,
    ) -> WsFederationResult<ValidationResult> {
        let client = match self.resolve_client(message).await? {
            Ok(client) => client,
            Err(failure) => return Ok(failure),
        };

        let reply_url = self.resolve_post_logout_reply_url(&client, message).await?;

        let relying_party = self
            .relying_parties
            .find_relying_party_by_realm(&client.client_id)
            .await?;

        let optional = match self.validate_optional_parameters(message, &client) {
            Ok(optional) => optional,
            Err(failure) => return Ok(failure),
        };

        let signout_client_ids = match subject {
            Some(subject) => {
                self.provider
                    .clients_for_signout(&subject.session_id)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(ValidationResult::Success(ValidatedWsFederationRequest {
            message: message.clone(),
            relying_party,
            subject: subject.cloned(),
            reply_url,
            session_id: subject.map(|s| s.session_id.clone()),
            signout_client_ids,
            scopes: Vec::new(),
            time_checked: optional.time_checked,
            force_fresh_login: optional.force_fresh_login,
            freshness_minutes: optional.freshness_minutes,
            home_realm: optional.home_realm,
            client,
        }))
    }

    /// Steps shared by both flows: realm presence and length, then the
    /// client lookup and protocol-type check.
    async fn resolve_client(
        &self,
        message: &WsFederationMessage,
    ) -> WsFederationResult<Result<FederationClient, ValidationResult>> {
        let realm = match message.wtrealm.as_deref() {
            Some(realm) if !realm.is_empty() => realm,
            _ => {
                warn!("federation message without wtrealm");
                return Ok(Err(ValidationResult::failure(
                    error_codes::INVALID_REQUEST,
                    "wtrealm is missing",
                )));
            }
        };

        if realm.len() > self.options.input_length.realm {
            warn!(length = realm.len(), "wtrealm exceeds configured limit");
            return Ok(Err(ValidationResult::failure(
                error_codes::INVALID_REQUEST,
                "wtrealm is too long",
            )));
        }

        let Some(client) = self.provider.find_enabled_client(realm).await? else {
            warn!(realm, "no enabled client for realm");
            return Ok(Err(ValidationResult::failure(
                error_codes::INVALID_RELYING_PARTY,
                "unknown realm",
            )));
        };

        if client.protocol_type != ProtocolType::WsFederation {
            warn!(realm, "client does not speak ws-federation");
            return Ok(Err(ValidationResult::failure(
                error_codes::INVALID_RELYING_PARTY,
                "client protocol type is not ws-federation",
            )));
        }

        Ok(Ok(client))
    }

    /// Resolves the sign-in reply URL: an explicit valid `wreply` wins,
    /// an invalid one is ignored, and the client's first registered
    /// redirect URI is the fallback. No usable target fails closed.
    async fn resolve_sign_in_reply_url(
        &self,
        client: &FederationClient,
        message: &WsFederationMessage,
    ) -> WsFederationResult<Result<String, ValidationResult>> {
        if let Some(wreply) = message.wreply.as_deref() {
            if is_absolute_url(wreply) && self.provider.validate_reply_url(client, wreply).await? {
                return Ok(Ok(wreply.to_string()));
            }
            warn!(
                client_id = %client.client_id,
                "ignoring wreply outside the client's redirect set"
            );
        }

        match client.default_redirect_uri() {
            Some(default) => Ok(Ok(default.to_string())),
            None => {
                warn!(client_id = %client.client_id, "no usable reply URL");
                Ok(Err(ValidationResult::failure(
                    error_codes::INVALID_RELYING_PARTY,
                    "no reply URL registered for client",
                )))
            }
        }
    }

    /// Resolves the sign-out reply URL against the post-logout set. An
    /// unusable value is dropped rather than failing; sign-out proceeds
    /// without a redirect target.
    async fn resolve_post_logout_reply_url(
        &self,
        client: &FederationClient,
        message: &WsFederationMessage,
    ) -> WsFederationResult<Option<String>> {
        let Some(wreply) = message.wreply.as_deref() else {
            return Ok(None);
        };
        if is_absolute_url(wreply)
            && self
                .provider
                .validate_post_logout_url(client, wreply)
                .await?
        {
            return Ok(Some(wreply.to_string()));
        }
        warn!(
            client_id = %client.client_id,
            "ignoring wreply outside the client's post-logout set"
        );
        Ok(None)
    }

    /// Validates `wct`, `wfresh`, and `whr`.
    fn validate_optional_parameters(
        &self,
        message: &WsFederationMessage,
        client: &FederationClient,
    ) -> Result<OptionalParameters, ValidationResult> {
        let mut time_checked = false;
        if let Some(wct) = message.wct.as_deref() {
            let Some(instant) = timestamp::parse_wct(wct) else {
                warn!("malformed wct");
                return Err(ValidationResult::failure(
                    error_codes::INVALID_REQUEST,
                    "wct is not a valid timestamp",
                ));
            };
            if !timestamp::within_tolerance(instant, Utc::now(), self.options.wct_tolerance) {
                warn!(
                    tolerance = self.options.wct_tolerance,
                    "wct outside the freshness window"
                );
                return Err(ValidationResult::failure(
                    error_codes::INVALID_REQUEST,
                    "wct is outside the accepted time window",
                ));
            }
            time_checked = true;
        }

        let mut force_fresh_login = false;
        let mut freshness_minutes = None;
        if let Some(wfresh) = message.wfresh.as_deref() {
            match wfresh.trim().parse::<i64>() {
                Ok(0) => force_fresh_login = true,
                Ok(minutes) if minutes > 0 => freshness_minutes = Some(minutes),
                _ => {
                    warn!("malformed wfresh");
                    return Err(ValidationResult::failure(
                        error_codes::INVALID_REQUEST,
                        "wfresh must be a non-negative integer",
                    ));
                }
            }
        }

        let mut home_realm = None;
        if let Some(hint) = message.whr.as_deref() {
            let allowed = client.identity_provider_restrictions.is_empty()
                || client
                    .identity_provider_restrictions
                    .iter()
                    .any(|p| p == hint);
            if allowed {
                home_realm = Some(hint.to_string());
            } else {
                debug!(
                    client_id = %client.client_id,
                    "dropping whr hint outside the client's provider restrictions"
                );
            }
        }

        Ok(OptionalParameters {
            time_checked,
            force_fresh_login,
            freshness_minutes,
            home_realm,
        })
    }
}

/// Coarse shape check for browser-reachable reply targets; the host's
/// redirect validation does the real matching.
fn is_absolute_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

/// `wreq` and `wreqptr` are mutually exclusive, and both are bounded.
fn validate_token_request_payload(
    message: &WsFederationMessage,
    options: &WsFederationOptions,
) -> Option<ValidationResult> {
    if message.wreq.is_some() && message.wreqptr.is_some() {
        warn!("both wreq and wreqptr present");
        return Some(ValidationResult::failure(
            error_codes::INVALID_REQUEST,
            "wreq and wreqptr are mutually exclusive",
        ));
    }
    if let Some(pointer) = message.wreqptr.as_deref()
        && pointer.len() > MAX_WREQPTR_LENGTH
    {
        warn!(length = pointer.len(), "wreqptr too long");
        return Some(ValidationResult::failure(
            error_codes::INVALID_REQUEST,
            "wreqptr exceeds the maximum length",
        ));
    }
    if let Some(request) = message.wreq.as_deref()
        && request.len() > options.input_length.wreq
    {
        warn!(length = request.len(), "wreq too long");
        return Some(ValidationResult::failure(
            error_codes::INVALID_REQUEST,
            "wreq exceeds the configured maximum length",
        ));
    }
    None
}
