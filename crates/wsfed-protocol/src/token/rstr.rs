//! WS-Trust `RequestSecurityTokenResponse` envelopes.
//!
//! The issued token travels back to the relying party inside an RSTR in
//! the `wresult` form field. The two WS-Trust generations differ in
//! prefix, namespace, and nesting: the February 2005 drafts send the
//! response element bare under `t`, WS-Trust 1.3 wraps it in a
//! `RequestSecurityTokenResponseCollection` under `trust`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};

use wsfed_model::{TokenType, WsTrustVersion};

use crate::constants::{BASE64_BINARY_ENCODING, INSTANT_FORMAT, namespaces};

use super::{IssuedToken, xml_escape};

/// A WS-Trust response carrying one issued token.
#[derive(Debug, Clone)]
pub struct RequestSecurityTokenResponse {
    /// `wctx` passthrough, serialized as the `Context` attribute.
    pub context: Option<String>,

    /// Start of the token validity window.
    pub created: DateTime<Utc>,

    /// End of the token validity window.
    pub expires: DateTime<Utc>,

    /// Relying party realm for `wsp:AppliesTo`.
    pub applies_to: String,

    /// The issued token.
    pub token: IssuedToken,
}

impl RequestSecurityTokenResponse {
    /// Creates a response for the given token and validity window.
    #[must_use]
    pub fn new(
        applies_to: impl Into<String>,
        token: IssuedToken,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            context: None,
            created,
            expires,
            applies_to: applies_to.into(),
            token,
        }
    }

    /// Sets the `Context` attribute.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Serializes the response for the requested WS-Trust generation.
    ///
    /// An unresolved [`WsTrustVersion::Default`] serializes as 1.3.
    #[must_use]
    pub fn to_xml(&self, version: WsTrustVersion) -> String {
        match version {
            WsTrustVersion::WsTrust2005 => {
                self.response_element("t", namespaces::WS_TRUST_2005, true)
            }
            WsTrustVersion::WsTrust13 | WsTrustVersion::Default => format!(
                "<trust:RequestSecurityTokenResponseCollection xmlns:trust=\"{}\">{}</trust:RequestSecurityTokenResponseCollection>",
                namespaces::WS_TRUST_13,
                self.response_element("trust", namespaces::WS_TRUST_13, false),
            ),
        }
    }

    /// Builds the response element. `declare_namespace` is false when an
    /// enclosing collection already declared the prefix.
    fn response_element(&self, prefix: &str, namespace: &str, declare_namespace: bool) -> String {
        let context_attribute = self
            .context
            .as_deref()
            .map(|context| format!(" Context=\"{}\"", xml_escape(context)))
            .unwrap_or_default();
        let namespace_attribute = if declare_namespace {
            format!(" xmlns:{prefix}=\"{namespace}\"")
        } else {
            String::new()
        };

        let token_xml = match self.token.token_type {
            TokenType::Jwt => format!(
                "<wsse:BinarySecurityToken xmlns:wsse=\"{}\" ValueType=\"{}\" EncodingType=\"{}\">{}</wsse:BinarySecurityToken>",
                namespaces::WS_SECURITY,
                TokenType::Jwt.uri(),
                BASE64_BINARY_ENCODING,
                BASE64.encode(self.token.content.as_bytes()),
            ),
            _ => self.token.content.clone(),
        };

        format!(
            "<{prefix}:RequestSecurityTokenResponse{context_attribute}{namespace_attribute}><{prefix}:Lifetime><wsu:Created xmlns:wsu=\"{wsu}\">{created}</wsu:Created><wsu:Expires xmlns:wsu=\"{wsu}\">{expires}</wsu:Expires></{prefix}:Lifetime><wsp:AppliesTo xmlns:wsp=\"{wsp}\"><wsa:EndpointReference xmlns:wsa=\"{wsa}\"><wsa:Address>{applies_to}</wsa:Address></wsa:EndpointReference></wsp:AppliesTo><{prefix}:RequestedSecurityToken>{token_xml}</{prefix}:RequestedSecurityToken><{prefix}:TokenType>{token_type}</{prefix}:TokenType></{prefix}:RequestSecurityTokenResponse>",
            wsu = namespaces::WS_UTILITY,
            wsp = namespaces::WS_POLICY,
            wsa = namespaces::WS_ADDRESSING,
            created = self.created.format(INSTANT_FORMAT),
            expires = self.expires.format(INSTANT_FORMAT),
            applies_to = xml_escape(&self.applies_to),
            token_type = self.token.token_type.uri(),
        )
    }
}
