//! The WS-Federation passive-profile message.
//!
//! A passive request or response is a flat set of `w*` query parameters.
//! The same struct deserializes from a query string or form body and
//! serializes back for redirects, so round-tripping a message through a
//! login redirect loses nothing.

use serde::{Deserialize, Serialize};
use wsfed_core::event::REDACTION_MARKER;

use crate::constants::actions;

/// A passive-profile protocol message.
///
/// All parameters are optional at this layer; the validator decides which
/// combinations are acceptable for which action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsFederationMessage {
    /// `wa` - protocol action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wa: Option<String>,

    /// `wtrealm` - realm URI of the relying party.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wtrealm: Option<String>,

    /// `wreply` - where to send the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wreply: Option<String>,

    /// `wctx` - opaque relying-party context, echoed back verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wctx: Option<String>,

    /// `wct` - request timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wct: Option<String>,

    /// `wfresh` - maximum session age in minutes; `0` forces re-login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wfresh: Option<String>,

    /// `whr` - home realm hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whr: Option<String>,

    /// `wreq` - inline token request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wreq: Option<String>,

    /// `wreqptr` - URL pointing at a token request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wreqptr: Option<String>,

    /// `wauth` - requested authentication type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wauth: Option<String>,

    /// `wresult` - the response envelope on sign-in responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wresult: Option<String>,
}

impl WsFederationMessage {
    /// Creates a sign-in request for a realm.
    #[must_use]
    pub fn sign_in(realm: impl Into<String>) -> Self {
        Self {
            wa: Some(actions::SIGN_IN.to_string()),
            wtrealm: Some(realm.into()),
            ..Self::default()
        }
    }

    /// True when `wa` requests a sign-in.
    #[must_use]
    pub fn is_sign_in(&self) -> bool {
        self.wa.as_deref() == Some(actions::SIGN_IN)
    }

    /// True when `wa` requests a sign-out or a sign-out cleanup.
    #[must_use]
    pub fn is_sign_out(&self) -> bool {
        matches!(
            self.wa.as_deref(),
            Some(actions::SIGN_OUT | actions::SIGN_OUT_CLEANUP)
        )
    }

    /// Serializes the message to a query string without a leading `?`.
    ///
    /// A flat struct of optional strings cannot fail urlencoding, so this
    /// returns the empty string rather than an error in that case.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }

    /// Derives the message to replay after a login round trip.
    ///
    /// `wct` described the original request's send time and would be
    /// stale, and a satisfied `wfresh=0` must not force login forever, so
    /// both are dropped. Everything else is carried verbatim.
    #[must_use]
    pub fn callback_message(&self) -> Self {
        let mut callback = self.clone();
        callback.wct = None;
        if callback
            .wfresh
            .as_deref()
            .is_some_and(|w| w.trim().parse::<i64>() == Ok(0))
        {
            callback.wfresh = None;
        }
        callback
    }

    /// Present parameters as audit detail pairs, with request payloads and
    /// result envelopes redacted.
    #[must_use]
    pub fn redacted_details(&self) -> Vec<(String, String)> {
        let mut details = Vec::new();
        let mut push = |key: &str, value: &Option<String>, redact: bool| {
            if let Some(value) = value {
                let shown = if redact { REDACTION_MARKER } else { value };
                details.push((key.to_string(), shown.to_string()));
            }
        };
        push("wa", &self.wa, false);
        push("wtrealm", &self.wtrealm, false);
        push("wreply", &self.wreply, false);
        push("wctx", &self.wctx, false);
        push("wct", &self.wct, false);
        push("wfresh", &self.wfresh, false);
        push("whr", &self.whr, false);
        push("wreq", &self.wreq, true);
        push("wreqptr", &self.wreqptr, true);
        push("wauth", &self.wauth, false);
        push("wresult", &self.wresult, true);
        details
    }
}
