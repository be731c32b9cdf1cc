//! Audit events for federation flows.
//!
//! ## NIST 800-53 Rev5: AU-2 (Event Logging)
//!
//! Every sign-in, sign-out, and token issuance raises an event toward the
//! host's event sink, success and failure alike.
//!
//! ## NIST 800-53 Rev5: AU-3 (Content of Audit Records)
//!
//! Events carry a timestamp, the realm and subject involved when known,
//! the outcome, and protocol details. Sensitive parameter values are
//! redacted before they reach the details list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker substituted for sensitive parameter values in event details.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Federation event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FederationEventType {
    /// Sign-in request accepted and a token issued.
    SignInSuccess,
    /// Sign-in request rejected.
    SignInFailure,
    /// Sign-out request accepted.
    SignOutSuccess,
    /// Sign-out request rejected.
    SignOutFailure,
    /// A security token was created for a relying party.
    TokenIssued,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An audit event raised toward the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationEvent {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event (ISO 8601).
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: FederationEventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Realm the request addressed, when it carried one.
    pub realm: Option<String>,

    /// Subject involved, when a session was present.
    pub subject_id: Option<String>,

    /// Host session identifier.
    pub session_id: Option<String>,

    /// Error code for failure events.
    pub error: Option<String>,

    /// Protocol details as key-value pairs, already redacted.
    pub details: Vec<(String, String)>,
}

impl FederationEvent {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: FederationEventType) -> FederationEventBuilder {
        FederationEventBuilder::new(event_type)
    }
}

/// Builder for federation events.
pub struct FederationEventBuilder {
    event_type: FederationEventType,
    outcome: EventOutcome,
    realm: Option<String>,
    subject_id: Option<String>,
    session_id: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl FederationEventBuilder {
    /// Creates a new builder with a success outcome.
    #[must_use]
    pub const fn new(event_type: FederationEventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            realm: None,
            subject_id: None,
            session_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error code.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the realm.
    #[must_use]
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Sets the subject identifier.
    #[must_use]
    pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Sets the session identifier.
    #[must_use]
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Adds all given detail pairs.
    #[must_use]
    pub fn details(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.details.extend(pairs);
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> FederationEvent {
        FederationEvent {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            realm: self.realm,
            subject_id: self.subject_id,
            session_id: self.session_id,
            error: self.error,
            details: self.details,
        }
    }
}
