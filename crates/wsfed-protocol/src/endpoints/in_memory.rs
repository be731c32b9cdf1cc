//! In-memory host provider.
//!
//! A self-contained [`FederationHostProvider`] backed by maps seeded at
//! construction. Hosts embedding the plugin implement the trait against
//! their own stores; this one exists for tests, demos, and as a reference
//! for what each contract method is expected to do.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use wsfed_core::FederationEvent;
use wsfed_model::{AuthenticatedSubject, Claim, FederationClient};

use crate::endpoints::state::{
    FederationHostProvider, HostError, LogoutNotification,
};
use crate::signature::SigningMaterial;

/// Cookie carrying the host session identifier.
pub const SESSION_COOKIE: &str = "wsfed.session";

/// Host provider backed by in-memory maps.
///
/// Seed data goes in through the `with_*` builders before the provider is
/// shared; events and logout notifications raised at runtime are captured
/// behind locks and can be read back through [`events`] and
/// [`logout_notifications`].
///
/// [`events`]: Self::events
/// [`logout_notifications`]: Self::logout_notifications
pub struct InMemoryHostProvider {
    base_url: String,
    clients: HashMap<String, FederationClient>,
    subjects: HashMap<String, AuthenticatedSubject>,
    deactivated_subjects: HashSet<String>,
    signing: Option<SigningMaterial>,
    scope_claim_types: HashMap<String, Vec<String>>,
    profile_claims: HashMap<String, Vec<Claim>>,
    signout_clients: HashMap<String, Vec<String>>,
    events: RwLock<Vec<FederationEvent>>,
    notifications: RwLock<Vec<LogoutNotification>>,
}

impl InMemoryHostProvider {
    /// Creates an empty provider for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            clients: HashMap::new(),
            subjects: HashMap::new(),
            deactivated_subjects: HashSet::new(),
            signing: None,
            scope_claim_types: HashMap::new(),
            profile_claims: HashMap::new(),
            signout_clients: HashMap::new(),
            events: RwLock::new(Vec::new()),
            notifications: RwLock::new(Vec::new()),
        }
    }

    /// Registers a client, keyed by its client id.
    #[must_use]
    pub fn with_client(mut self, client: FederationClient) -> Self {
        self.clients.insert(client.client_id.clone(), client);
        self
    }

    /// Attaches an authenticated subject to a session id. Requests whose
    /// session cookie carries that id resolve to this subject.
    #[must_use]
    pub fn with_subject(
        mut self,
        session_id: impl Into<String>,
        subject: AuthenticatedSubject,
    ) -> Self {
        self.subjects.insert(session_id.into(), subject);
        self
    }

    /// Marks a subject id as deactivated.
    #[must_use]
    pub fn with_deactivated_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.deactivated_subjects.insert(subject_id.into());
        self
    }

    /// Installs signing key material.
    #[must_use]
    pub fn with_signing_material(mut self, material: SigningMaterial) -> Self {
        self.signing = Some(material);
        self
    }

    /// Declares the claim types a scope covers.
    #[must_use]
    pub fn with_claim_types_for_scope(
        mut self,
        scope: impl Into<String>,
        claim_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.scope_claim_types.insert(
            scope.into(),
            claim_types.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Seeds profile claims for a subject id.
    #[must_use]
    pub fn with_profile_claims(
        mut self,
        subject_id: impl Into<String>,
        claims: impl IntoIterator<Item = Claim>,
    ) -> Self {
        self.profile_claims
            .insert(subject_id.into(), claims.into_iter().collect());
        self
    }

    /// Declares the clients with front-channel sessions for a session id.
    #[must_use]
    pub fn with_signout_clients(
        mut self,
        session_id: impl Into<String>,
        client_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.signout_clients.insert(
            session_id.into(),
            client_ids.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Events raised so far.
    pub async fn events(&self) -> Vec<FederationEvent> {
        self.events.read().await.clone()
    }

    /// Logout notifications stored so far.
    pub async fn logout_notifications(&self) -> Vec<LogoutNotification> {
        self.notifications.read().await.clone()
    }

    fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
        let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
        cookies.split(';').find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(SESSION_COOKIE)?
                .strip_prefix('=')
                .map(str::to_string)
        })
    }
}

impl std::fmt::Debug for InMemoryHostProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHostProvider")
            .field("base_url", &self.base_url)
            .field("clients", &self.clients.len())
            .field("subjects", &self.subjects.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FederationHostProvider for InMemoryHostProvider {
    async fn find_enabled_client(
        &self,
        realm: &str,
    ) -> Result<Option<FederationClient>, HostError> {
        Ok(self
            .clients
            .get(realm)
            .filter(|client| client.enabled)
            .cloned())
    }

    async fn validate_reply_url(
        &self,
        client: &FederationClient,
        url: &str,
    ) -> Result<bool, HostError> {
        Ok(client.is_valid_redirect_uri(url))
    }

    async fn validate_post_logout_url(
        &self,
        client: &FederationClient,
        url: &str,
    ) -> Result<bool, HostError> {
        Ok(client.is_valid_post_logout_uri(url))
    }

    async fn current_subject(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedSubject>, HostError> {
        let Some(session_id) = Self::session_id_from_headers(headers) else {
            return Ok(None);
        };
        Ok(self.subjects.get(&session_id).cloned())
    }

    async fn is_subject_active(
        &self,
        subject: &AuthenticatedSubject,
        _client: &FederationClient,
    ) -> Result<bool, HostError> {
        Ok(!self.deactivated_subjects.contains(&subject.subject_id))
    }

    async fn claim_types_for_scopes(&self, scopes: &[String]) -> Result<Vec<String>, HostError> {
        let mut seen = HashSet::new();
        let mut claim_types = Vec::new();
        for scope in scopes {
            for claim_type in self.scope_claim_types.get(scope).into_iter().flatten() {
                if seen.insert(claim_type.clone()) {
                    claim_types.push(claim_type.clone());
                }
            }
        }
        Ok(claim_types)
    }

    async fn issue_profile_claims(
        &self,
        subject: &AuthenticatedSubject,
        _client: &FederationClient,
        claim_types: &[String],
    ) -> Result<Vec<Claim>, HostError> {
        Ok(self
            .profile_claims
            .get(&subject.subject_id)
            .into_iter()
            .flatten()
            .filter(|claim| claim_types.contains(&claim.claim_type))
            .cloned()
            .collect())
    }

    async fn signing_material(&self) -> Result<Option<SigningMaterial>, HostError> {
        Ok(self.signing.clone())
    }

    async fn clients_for_signout(&self, session_id: &str) -> Result<Vec<String>, HostError> {
        Ok(self
            .signout_clients
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn store_logout_notification(
        &self,
        notification: &LogoutNotification,
    ) -> Result<Option<String>, HostError> {
        self.notifications.write().await.push(notification.clone());
        let empty = notification.client_ids.is_empty()
            && notification.post_logout_redirect_uri.is_none()
            && notification.context.is_none();
        Ok((!empty).then(|| Uuid::now_v7().to_string()))
    }

    async fn raise_event(&self, event: FederationEvent) -> Result<(), HostError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn base_url(&self) -> Result<String, HostError> {
        Ok(self.base_url.clone())
    }
}
