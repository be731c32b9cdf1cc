//! Endpoint state and the host provider contract.

use std::sync::Arc;

use axum::http::HeaderMap;
use wsfed_core::{FederationEvent, WsFederationOptions};
use wsfed_model::{AuthenticatedSubject, Claim, FederationClient};
use wsfed_store::RelyingPartyStore;

use crate::interaction::InteractionResponseGenerator;
use crate::response::SignInResponseGenerator;
use crate::signature::SigningMaterial;
use crate::token::TokenHandlerRegistry;
use crate::validation::WsFederationRequestValidator;

/// Shared state for the federation endpoints.
///
/// Holds the host provider, plugin options, the relying-party store, and
/// the token-handler registry resolved once at construction.
pub struct WsFederationState<P>
where
    P: FederationHostProvider,
{
    provider: Arc<P>,
    options: Arc<WsFederationOptions>,
    relying_parties: Arc<dyn RelyingPartyStore>,
    token_handlers: Arc<TokenHandlerRegistry>,
}

impl<P: FederationHostProvider> WsFederationState<P> {
    /// Creates endpoint state with the default token handlers.
    pub fn new(
        provider: Arc<P>,
        options: WsFederationOptions,
        relying_parties: Arc<dyn RelyingPartyStore>,
    ) -> Self {
        Self {
            provider,
            options: Arc::new(options),
            relying_parties,
            token_handlers: Arc::new(TokenHandlerRegistry::with_default_handlers()),
        }
    }

    /// The host provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Plugin options.
    #[must_use]
    pub fn options(&self) -> &WsFederationOptions {
        &self.options
    }

    /// Token handlers registered for this deployment.
    #[must_use]
    pub fn token_handlers(&self) -> &TokenHandlerRegistry {
        &self.token_handlers
    }

    /// Builds the request validator for this state.
    #[must_use]
    pub fn validator(&self) -> WsFederationRequestValidator<P> {
        WsFederationRequestValidator::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.relying_parties),
            Arc::clone(&self.options),
        )
    }

    /// Builds the interaction generator for this state.
    #[must_use]
    pub fn interaction_generator(&self) -> InteractionResponseGenerator<P> {
        InteractionResponseGenerator::new(Arc::clone(&self.provider))
    }

    /// Builds the sign-in response generator for this state.
    #[must_use]
    pub fn response_generator(&self) -> SignInResponseGenerator<P> {
        SignInResponseGenerator::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.options),
            Arc::clone(&self.token_handlers),
        )
    }
}

// Manual impl: the provider itself need not be Clone behind the Arc.
impl<P: FederationHostProvider> Clone for WsFederationState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            options: Arc::clone(&self.options),
            relying_parties: Arc::clone(&self.relying_parties),
            token_handlers: Arc::clone(&self.token_handlers),
        }
    }
}

/// Everything the plugin needs from its OpenID Connect host.
///
/// The host owns clients, sessions, profile data, key material, and the
/// audit sink; the plugin only ever reaches them through this contract.
#[async_trait::async_trait]
pub trait FederationHostProvider: Send + Sync + 'static {
    /// Finds an enabled client whose id matches the realm. Disabled
    /// clients are reported as absent.
    async fn find_enabled_client(&self, realm: &str) -> HostResult<Option<FederationClient>>;

    /// Checks a reply URL against the client's redirect registrations.
    async fn validate_reply_url(
        &self,
        client: &FederationClient,
        url: &str,
    ) -> HostResult<bool>;

    /// Checks a post-logout reply URL against the client's post-logout
    /// registrations.
    async fn validate_post_logout_url(
        &self,
        client: &FederationClient,
        url: &str,
    ) -> HostResult<bool>;

    /// Resolves the authenticated subject for a request, if any.
    async fn current_subject(
        &self,
        headers: &HeaderMap,
    ) -> HostResult<Option<AuthenticatedSubject>>;

    /// Whether the subject is still active for this client. Deactivated
    /// accounts force a fresh login.
    async fn is_subject_active(
        &self,
        subject: &AuthenticatedSubject,
        client: &FederationClient,
    ) -> HostResult<bool>;

    /// Resolves the claim types covered by the given scopes.
    async fn claim_types_for_scopes(&self, scopes: &[String]) -> HostResult<Vec<String>>;

    /// Fetches profile claims for the subject, limited to the requested
    /// claim types.
    async fn issue_profile_claims(
        &self,
        subject: &AuthenticatedSubject,
        client: &FederationClient,
        claim_types: &[String],
    ) -> HostResult<Vec<Claim>>;

    /// Current signing key and certificate, when configured.
    async fn signing_material(&self) -> HostResult<Option<SigningMaterial>>;

    /// Clients with active front-channel sessions for the given host
    /// session, for sign-out cleanup notification.
    async fn clients_for_signout(&self, session_id: &str) -> HostResult<Vec<String>>;

    /// Persists a logout notification for the host logout page, returning
    /// its identifier when there is anything to carry.
    async fn store_logout_notification(
        &self,
        notification: &LogoutNotification,
    ) -> HostResult<Option<String>>;

    /// Raises an audit event into the host's event sink.
    async fn raise_event(&self, event: FederationEvent) -> HostResult<()>;

    /// The host's externally visible base URL, no trailing slash.
    async fn base_url(&self) -> HostResult<String>;
}

/// Context carried to the host logout page after a validated sign-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutNotification {
    /// Host session being terminated.
    pub session_id: Option<String>,

    /// Subject being signed out.
    pub subject_id: Option<String>,

    /// Clients to notify with `wsignoutcleanup1.0`.
    pub client_ids: Vec<String>,

    /// Validated post-logout redirect target.
    pub post_logout_redirect_uri: Option<String>,

    /// `wctx` passthrough for the relying party.
    pub context: Option<String>,
}

/// Error type for host provider operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host's storage layer failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The host's session layer failed.
    #[error("session error: {0}")]
    Session(String),

    /// The host's profile service failed.
    #[error("profile service error: {0}")]
    Profile(String),

    /// Key material retrieval failed.
    #[error("key material error: {0}")]
    KeyMaterial(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for host provider operations.
pub type HostResult<T> = Result<T, HostError>;
