//! Host client registrations as seen through the plugin contract.

use serde::{Deserialize, Serialize};

/// Protocol a registered client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolType {
    /// OpenID Connect, the host's native protocol.
    #[default]
    OpenidConnect,
    /// WS-Federation passive profile.
    WsFederation,
}

/// A client registration in the host's client store.
///
/// For WS-Federation clients the `client_id` is the realm URI and the
/// redirect URIs double as acceptable `wreply` targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationClient {
    /// Unique client identifier; the realm URI for federation clients.
    pub client_id: String,

    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    /// Disabled clients are treated as unknown.
    pub enabled: bool,

    /// Protocol this registration speaks.
    pub protocol_type: ProtocolType,

    /// Registered reply URLs, in registration order. The first entry is
    /// the default reply target when the request carries no usable
    /// `wreply`.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Registered post-logout reply URLs.
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,

    /// Scopes this client may request; drives which claim types are
    /// loaded for token issuance.
    #[serde(default)]
    pub allowed_scopes: Vec<String>,

    /// Identity providers the client accepts. Empty means no restriction.
    #[serde(default)]
    pub identity_provider_restrictions: Vec<String>,

    /// Whether sessions authenticated by the host's own login page are
    /// acceptable.
    pub enable_local_login: bool,

    /// Client-specific cap on session age, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_sso_lifetime: Option<i64>,
}

impl FederationClient {
    /// Creates an enabled WS-Federation client for the given realm.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_name: None,
            enabled: true,
            protocol_type: ProtocolType::WsFederation,
            redirect_uris: Vec::new(),
            post_logout_redirect_uris: Vec::new(),
            allowed_scopes: Vec::new(),
            identity_provider_restrictions: Vec::new(),
            enable_local_login: true,
            user_sso_lifetime: None,
        }
    }

    /// Registers a reply URL.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.push(uri.into());
        self
    }

    /// Registers a post-logout reply URL.
    #[must_use]
    pub fn with_post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.post_logout_redirect_uris.push(uri.into());
        self
    }

    /// Allows a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.allowed_scopes.push(scope.into());
        self
    }

    /// Restricts acceptable identity providers.
    #[must_use]
    pub fn with_identity_provider_restriction(mut self, provider: impl Into<String>) -> Self {
        self.identity_provider_restrictions.push(provider.into());
        self
    }

    /// Checks a reply URL against the registered redirect URIs.
    ///
    /// A registration ending in `/*` matches any URL under that prefix.
    #[must_use]
    pub fn is_valid_redirect_uri(&self, uri: &str) -> bool {
        Self::uri_matches(&self.redirect_uris, uri)
    }

    /// Checks a post-logout reply URL against the registered set.
    #[must_use]
    pub fn is_valid_post_logout_uri(&self, uri: &str) -> bool {
        Self::uri_matches(&self.post_logout_redirect_uris, uri)
    }

    /// The default reply target, if any URIs are registered.
    #[must_use]
    pub fn default_redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(String::as_str)
    }

    fn uri_matches(registered: &[String], uri: &str) -> bool {
        registered.iter().any(|candidate| {
            if let Some(prefix) = candidate.strip_suffix("/*")
                && uri.starts_with(prefix)
            {
                return true;
            }
            candidate == uri
        })
    }
}
