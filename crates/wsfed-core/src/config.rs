//! Plugin configuration.
//!
//! The host constructs [`WsFederationOptions`] once at startup and hands
//! it to the plugin. Every relying party without an explicit override is
//! served from these defaults, so the `Default` impl encodes the
//! interoperable baseline: SAML 1.1 tokens, RSA-SHA256 signatures, the
//! WIF claim mapping, and WS-Trust 1.3 envelopes.

use serde::{Deserialize, Serialize};
use wsfed_crypto::{DigestAlgorithm, EncryptionAlgorithm, KeyWrapAlgorithm, SignatureAlgorithm};
use wsfed_model::claim::{claim_types, name_id_formats};
use wsfed_model::{TokenType, WsTrustVersion};

/// Top-level plugin options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WsFederationOptions {
    /// Issuer URI stamped into tokens and metadata. `None` derives the
    /// issuer from the host's base URL.
    pub issuer_uri: Option<String>,

    /// Token type issued when the relying party has no override.
    pub default_token_type: TokenType,

    /// Signature algorithm for assertions and metadata.
    pub default_signature_algorithm: SignatureAlgorithm,

    /// Digest algorithm for assertion references.
    pub default_digest_algorithm: DigestAlgorithm,

    /// NameID format stamped on name-identifier claims lacking one.
    pub default_name_identifier_format: String,

    /// Content-encryption algorithm when a relying party has an
    /// encryption certificate but no algorithm override.
    pub default_encryption_algorithm: EncryptionAlgorithm,

    /// Key-transport algorithm paired with the above.
    pub default_key_wrap_algorithm: KeyWrapAlgorithm,

    /// WS-Trust envelope version when the relying party defers.
    pub default_ws_trust_version: WsTrustVersion,

    /// Claim-type mapping applied when the relying party defines none:
    /// host claim names to WS-* claim-type URIs.
    pub default_claim_mapping: Vec<(String, String)>,

    /// Issued token validity in seconds.
    pub token_lifetime: i64,

    /// Accepted clock skew around `wct`, in seconds, applied to both
    /// sign-in and sign-out messages.
    pub wct_tolerance: i64,

    /// Host login page.
    pub login_url: String,

    /// Host logout page.
    pub logout_url: String,

    /// Query parameter the login page reads the return URL from.
    pub return_url_parameter: String,

    /// Query parameter the logout page reads the logout-notification
    /// identifier from.
    pub logout_id_parameter: String,

    /// Upper bounds on inbound parameter sizes.
    pub input_length: InputLengthRestrictions,

    /// Metadata document options.
    pub metadata: MetadataOptions,

    /// Content-Security-Policy emitted with HTML responses.
    pub csp: CspOptions,
}

impl Default for WsFederationOptions {
    fn default() -> Self {
        Self {
            issuer_uri: None,
            default_token_type: TokenType::Saml11,
            default_signature_algorithm: SignatureAlgorithm::RsaSha256,
            default_digest_algorithm: DigestAlgorithm::Sha256,
            default_name_identifier_format: name_id_formats::UNSPECIFIED.to_string(),
            default_encryption_algorithm: EncryptionAlgorithm::Aes256Cbc,
            default_key_wrap_algorithm: KeyWrapAlgorithm::RsaOaep,
            default_ws_trust_version: WsTrustVersion::WsTrust13,
            default_claim_mapping: default_claim_mapping(),
            token_lifetime: 300,
            wct_tolerance: 300,
            login_url: "/account/login".to_string(),
            logout_url: "/account/logout".to_string(),
            return_url_parameter: "returnUrl".to_string(),
            logout_id_parameter: "logoutId".to_string(),
            input_length: InputLengthRestrictions::default(),
            metadata: MetadataOptions::default(),
            csp: CspOptions::default(),
        }
    }
}

impl WsFederationOptions {
    /// Overrides the issuer URI.
    #[must_use]
    pub fn with_issuer_uri(mut self, issuer: impl Into<String>) -> Self {
        self.issuer_uri = Some(issuer.into());
        self
    }

    /// Overrides the default token type.
    #[must_use]
    pub const fn with_default_token_type(mut self, token_type: TokenType) -> Self {
        self.default_token_type = token_type;
        self
    }

    /// Overrides the token lifetime in seconds.
    #[must_use]
    pub const fn with_token_lifetime(mut self, seconds: i64) -> Self {
        self.token_lifetime = seconds;
        self
    }

    /// Overrides the `wct` tolerance in seconds.
    #[must_use]
    pub const fn with_wct_tolerance(mut self, seconds: i64) -> Self {
        self.wct_tolerance = seconds;
        self
    }
}

/// The WIF-era mapping from host claim names to WS-* claim-type URIs.
fn default_claim_mapping() -> Vec<(String, String)> {
    [
        ("sub", claim_types::NAME_IDENTIFIER),
        ("name", claim_types::NAME),
        ("given_name", claim_types::GIVEN_NAME),
        ("family_name", claim_types::SURNAME),
        ("email", claim_types::EMAIL_ADDRESS),
        ("birthdate", claim_types::DATE_OF_BIRTH),
        ("website", claim_types::WEBPAGE),
        ("gender", claim_types::GENDER),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

/// Upper bounds on inbound message parameters.
///
/// Oversized values are rejected during validation before any store or
/// host lookup happens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLengthRestrictions {
    /// Maximum `wtrealm` length.
    pub realm: usize,

    /// Maximum `wreq` length.
    pub wreq: usize,
}

impl Default for InputLengthRestrictions {
    fn default() -> Self {
        Self {
            realm: 512,
            wreq: 32_768,
        }
    }
}

/// Federation metadata document options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOptions {
    /// Lowercase the entity identifier, matching case-sensitive relying
    /// parties that normalize issuer comparisons.
    pub lowercase_entity_id: bool,

    /// Sign the metadata document when signing material is available.
    pub sign_metadata: bool,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            lowercase_entity_id: true,
            sign_metadata: true,
        }
    }
}

/// Content-Security-Policy level for the auto-post response page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CspLevel {
    /// CSP Level 1: hash plus `unsafe-inline` for browsers that ignore
    /// hashes.
    One,
    /// CSP Level 2: hash-only script source.
    #[default]
    Two,
}

/// Content-Security-Policy options for HTML responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CspOptions {
    /// Policy level.
    pub level: CspLevel,

    /// Also emit the legacy `X-Content-Security-Policy` header for
    /// pre-standard browsers.
    pub add_deprecated_header: bool,
}

impl Default for CspOptions {
    fn default() -> Self {
        Self {
            level: CspLevel::Two,
            add_deprecated_header: true,
        }
    }
}
