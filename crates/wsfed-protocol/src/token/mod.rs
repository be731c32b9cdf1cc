//! Security-token creation.
//!
//! A [`SecurityTokenDescriptor`] carries everything a handler needs to
//! mint a token: issuer, audience, lifetime, claims, key material, and
//! the optional authentication statement and encryption settings. The
//! [`TokenHandlerRegistry`] maps token types to handlers once at
//! startup; issuance is a plain enum dispatch from there.

mod encryption;
pub mod jwt;
pub mod rstr;
pub mod saml;

use chrono::{DateTime, Utc};
use wsfed_crypto::{DigestAlgorithm, EncryptionAlgorithm, KeyWrapAlgorithm, SignatureAlgorithm};
use wsfed_model::{Claim, TokenType};

use crate::error::{WsFederationError, WsFederationResult};
use crate::signature::SigningMaterial;

pub use jwt::JwtTokenHandler;
pub use rstr::RequestSecurityTokenResponse;
pub use saml::SamlTokenHandler;

/// How the subject authenticated, for the assertion's authentication
/// statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationInformation {
    /// SAML authentication-method URI.
    pub method: String,
    /// When the authentication happened.
    pub instant: DateTime<Utc>,
}

/// Encryption settings resolved for one relying party.
#[derive(Clone)]
pub struct EncryptionParameters {
    /// Relying party's X.509 certificate, DER.
    pub certificate_der: Vec<u8>,
    /// Content-encryption algorithm.
    pub encryption_algorithm: EncryptionAlgorithm,
    /// Key-transport algorithm for wrapping the content key.
    pub key_wrap_algorithm: KeyWrapAlgorithm,
}

impl std::fmt::Debug for EncryptionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionParameters")
            .field(
                "certificate_der",
                &format!("{} bytes", self.certificate_der.len()),
            )
            .field("encryption_algorithm", &self.encryption_algorithm)
            .field("key_wrap_algorithm", &self.key_wrap_algorithm)
            .finish()
    }
}

/// Everything a token handler needs to mint one token.
#[derive(Debug, Clone)]
pub struct SecurityTokenDescriptor {
    /// Token issuer, the plugin's issuer URI.
    pub issuer: String,

    /// Audience, the relying party's realm.
    pub audience: String,

    /// Claims to embed, already mapped for the target token type.
    pub claims: Vec<Claim>,

    /// Start of the validity window.
    pub created: DateTime<Utc>,

    /// End of the validity window.
    pub expires: DateTime<Utc>,

    /// Signing key and certificate.
    pub signing: SigningMaterial,

    /// Signature algorithm.
    pub signature_algorithm: SignatureAlgorithm,

    /// Digest algorithm for signature references.
    pub digest_algorithm: DigestAlgorithm,

    /// Authentication statement content. `None` omits the statement.
    pub authentication: Option<AuthenticationInformation>,

    /// Encryption settings. `None` issues the token in the clear.
    pub encryption: Option<EncryptionParameters>,
}

/// A minted token, ready for the WS-Trust envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// What kind of token `content` holds.
    pub token_type: TokenType,

    /// Serialized token. XML for the SAML flavors, the compact JWS form
    /// for JWT.
    pub content: String,
}

/// A registered token handler.
///
/// Closed set by design: the deployment chooses handlers at startup and
/// issuance never inspects types at runtime.
#[derive(Debug, Clone)]
pub enum TokenHandler {
    /// SAML 1.1 / SAML 2.0 assertions.
    Saml(SamlTokenHandler),
    /// JSON Web Tokens.
    Jwt(JwtTokenHandler),
}

impl TokenHandler {
    /// Mints a token from the descriptor.
    pub fn create_token(
        &self,
        descriptor: &SecurityTokenDescriptor,
    ) -> WsFederationResult<IssuedToken> {
        match self {
            Self::Saml(handler) => handler.create_token(descriptor),
            Self::Jwt(handler) => handler.create_token(descriptor),
        }
    }
}

/// Token handlers keyed by token type, resolved once at startup.
///
/// Registration order is preserved; metadata lists the offered token
/// types in that order.
#[derive(Debug, Clone, Default)]
pub struct TokenHandlerRegistry {
    handlers: Vec<(TokenType, TokenHandler)>,
}

impl TokenHandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Creates a registry with the stock handlers: SAML 1.1, SAML 2.0,
    /// and JWT.
    #[must_use]
    pub fn with_default_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(TokenType::Saml11, TokenHandler::Saml(SamlTokenHandler::saml11()));
        registry.register(TokenType::Saml2, TokenHandler::Saml(SamlTokenHandler::saml2()));
        registry.register(TokenType::Jwt, TokenHandler::Jwt(JwtTokenHandler::new()));
        registry
    }

    /// Registers a handler, replacing any previous handler for the type.
    pub fn register(&mut self, token_type: TokenType, handler: TokenHandler) {
        self.handlers.retain(|(t, _)| *t != token_type);
        self.handlers.push((token_type, handler));
    }

    /// Looks up the handler for a token type.
    #[must_use]
    pub fn handler_for(&self, token_type: TokenType) -> Option<&TokenHandler> {
        self.handlers
            .iter()
            .find(|(t, _)| *t == token_type)
            .map(|(_, handler)| handler)
    }

    /// Token types with a registered handler, in registration order.
    #[must_use]
    pub fn supported_types(&self) -> Vec<TokenType> {
        self.handlers.iter().map(|(t, _)| *t).collect()
    }

    /// Mints a token of the requested type.
    ///
    /// An unregistered type is a deployment configuration error, not a
    /// relying-party mistake.
    pub fn create_token(
        &self,
        token_type: TokenType,
        descriptor: &SecurityTokenDescriptor,
    ) -> WsFederationResult<IssuedToken> {
        let handler = self.handler_for(token_type).ok_or_else(|| {
            WsFederationError::UnsupportedTokenType(token_type.uri().to_string())
        })?;
        handler.create_token(descriptor)
    }
}

/// Escapes text for XML content and attribute values.
pub(crate) fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
