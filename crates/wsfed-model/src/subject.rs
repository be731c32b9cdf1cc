//! The authenticated subject handed over by the host session layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::Claim;

/// Snapshot of the host's authenticated session for one request.
///
/// The plugin never authenticates anyone itself; it reads this snapshot
/// from the host and decides whether the session satisfies the relying
/// party's requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedSubject {
    /// Stable subject identifier.
    pub subject_id: String,

    /// Host session identifier.
    pub session_id: String,

    /// Identity provider that authenticated the session; `local` for the
    /// host's own login page.
    pub identity_provider: String,

    /// Authentication method reference, `pwd` for password login.
    pub authentication_method: String,

    /// When the session authenticated.
    pub authentication_time: DateTime<Utc>,

    /// Claims already attached to the session principal.
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl AuthenticatedSubject {
    /// Creates a locally-authenticated password subject.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            session_id: session_id.into(),
            identity_provider: "local".to_string(),
            authentication_method: "pwd".to_string(),
            authentication_time: Utc::now(),
            claims: Vec::new(),
        }
    }

    /// Sets the identity provider.
    #[must_use]
    pub fn with_identity_provider(mut self, provider: impl Into<String>) -> Self {
        self.identity_provider = provider.into();
        self
    }

    /// Sets the authentication method reference.
    #[must_use]
    pub fn with_authentication_method(mut self, method: impl Into<String>) -> Self {
        self.authentication_method = method.into();
        self
    }

    /// Sets the authentication time.
    #[must_use]
    pub fn with_authentication_time(mut self, time: DateTime<Utc>) -> Self {
        self.authentication_time = time;
        self
    }

    /// Attaches a session claim.
    #[must_use]
    pub fn with_claim(mut self, claim: Claim) -> Self {
        self.claims.push(claim);
        self
    }

    /// Finds a session claim by type.
    #[must_use]
    pub fn find_claim(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type == claim_type)
    }
}
