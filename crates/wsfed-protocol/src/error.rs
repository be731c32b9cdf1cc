//! WS-Federation protocol errors.
//!
//! Two families exist. Protocol-visible rejections (`invalid_request`,
//! `invalid_relying_party`) never leave the validator as errors; they come
//! back inside [`ValidationResult`]. Everything in this enum is an
//! operational failure: the request was acceptable but the plugin could
//! not serve it.
//!
//! [`ValidationResult`]: crate::validation::ValidationResult

use thiserror::Error;
use wsfed_store::StoreError;

use crate::endpoints::state::HostError;

/// Errors raised while serving a federation request.
#[derive(Debug, Error)]
pub enum WsFederationError {
    /// The request was structurally unusable before validation could run.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No signing material is configured on the host.
    #[error("no signing key material available")]
    MissingSigningKey,

    /// No token handler is registered for the requested token type.
    #[error("no token handler registered for token type {0}")]
    UnsupportedTokenType(String),

    /// Token creation failed inside a handler.
    #[error("token creation failed: {0}")]
    TokenCreation(String),

    /// XML signing failed.
    #[error("signature failed: {0}")]
    Signature(String),

    /// Token encryption for the relying party's certificate failed.
    #[error("token encryption failed: {0}")]
    Encryption(String),

    /// The host provider failed.
    #[error("host provider failure: {0}")]
    Host(#[from] HostError),

    /// The relying-party store failed.
    #[error("relying party store failure: {0}")]
    Store(#[from] StoreError),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WsFederationError {
    /// Returns the protocol error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            _ => "server_error",
        }
    }

    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            _ => 500,
        }
    }
}

/// Result alias for federation operations.
pub type WsFederationResult<T> = Result<T, WsFederationError>;
