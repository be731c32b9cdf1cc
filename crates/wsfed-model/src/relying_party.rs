//! Per-relying-party token issuance settings.

use serde::{Deserialize, Serialize};
use wsfed_crypto::{DigestAlgorithm, EncryptionAlgorithm, KeyWrapAlgorithm, SignatureAlgorithm};

use crate::token::{TokenType, WsTrustVersion};

/// WS-Federation settings for a single relying party, keyed by realm.
///
/// Every field other than `realm` overrides a plugin-level default; `None`
/// falls through to configuration. A missing record altogether means the
/// realm is served entirely from defaults. Records are read-only for the
/// duration of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelyingParty {
    /// Realm URI, matched against `wtrealm`.
    pub realm: String,

    /// Token type issued to this relying party.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,

    /// XML-DSig signature algorithm override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<SignatureAlgorithm>,

    /// XML-DSig digest algorithm override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<DigestAlgorithm>,

    /// SAML NameID format stamped on the name-identifier claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_identifier_format: Option<String>,

    /// DER-encoded X.509 certificate; when present, issued SAML tokens
    /// are encrypted for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_certificate: Option<Vec<u8>>,

    /// XML-Enc content-encryption algorithm override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_algorithm: Option<EncryptionAlgorithm>,

    /// XML-Enc key-transport algorithm override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_wrap_algorithm: Option<KeyWrapAlgorithm>,

    /// WS-Trust envelope version for responses to this relying party.
    #[serde(default)]
    pub ws_trust_version: WsTrustVersion,

    /// Ordered claim-type mapping, source type to emitted type. Source
    /// types must be unique; an empty mapping falls through to the
    /// configured default mapping.
    #[serde(default)]
    pub claim_mapping: Vec<(String, String)>,
}

impl RelyingParty {
    /// Creates a relying party served entirely from plugin defaults.
    #[must_use]
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            token_type: None,
            signature_algorithm: None,
            digest_algorithm: None,
            name_identifier_format: None,
            encryption_certificate: None,
            encryption_algorithm: None,
            key_wrap_algorithm: None,
            ws_trust_version: WsTrustVersion::Default,
            claim_mapping: Vec::new(),
        }
    }

    /// Overrides the issued token type.
    #[must_use]
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = Some(token_type);
        self
    }

    /// Overrides the signature algorithm.
    #[must_use]
    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = Some(algorithm);
        self
    }

    /// Overrides the NameID format.
    #[must_use]
    pub fn with_name_identifier_format(mut self, format: impl Into<String>) -> Self {
        self.name_identifier_format = Some(format.into());
        self
    }

    /// Enables token encryption for the given DER certificate.
    #[must_use]
    pub fn with_encryption_certificate(mut self, certificate_der: Vec<u8>) -> Self {
        self.encryption_certificate = Some(certificate_der);
        self
    }

    /// Selects the WS-Trust envelope version.
    #[must_use]
    pub fn with_ws_trust_version(mut self, version: WsTrustVersion) -> Self {
        self.ws_trust_version = version;
        self
    }

    /// Appends a claim-mapping entry.
    #[must_use]
    pub fn with_claim_mapping(
        mut self,
        from_type: impl Into<String>,
        to_type: impl Into<String>,
    ) -> Self {
        self.claim_mapping.push((from_type.into(), to_type.into()));
        self
    }

    /// Looks up the mapped type for a source claim type.
    #[must_use]
    pub fn mapped_type(&self, from_type: &str) -> Option<&str> {
        self.claim_mapping
            .iter()
            .find(|(from, _)| from == from_type)
            .map(|(_, to)| to.as_str())
    }
}
