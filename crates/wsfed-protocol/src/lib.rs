//! WS-Federation passive profile implementation.
//!
//! This crate plugs the WS-Federation passive protocol into an OpenID
//! Connect identity-provider host:
//!
//! - **Request validation** - `wsignin1.0` / `wsignout1.0` message
//!   validation against the host's client store
//! - **Interaction policy** - decide whether an existing session is good
//!   enough or the user must log in again
//! - **Token issuance** - SAML 1.1, SAML 2.0, and JWT security tokens,
//!   signed and optionally encrypted, wrapped in WS-Trust
//!   `RequestSecurityTokenResponse` envelopes
//! - **Metadata** - the federation metadata document under
//!   `/wsfederation/metadata`
//!
//! # Architecture
//!
//! - [`message`] - the passive-profile message and its query-string form
//! - [`validation`] - the sign-in / sign-out request validator
//! - [`interaction`] - session acceptability checks
//! - [`claims`] - claims retrieval and claim-type mapping
//! - [`token`] - token handlers and the WS-Trust response envelope
//! - [`signature`] - enveloped XML-DSig signing
//! - [`endpoints`] - Axum handlers and the host provider contract
//!
//! # Example
//!
//! ```rust,ignore
//! use wsfed_protocol::endpoints::{wsfederation_router, WsFederationState};
//! use axum::Router;
//!
//! let app = Router::new()
//!     .merge(wsfederation_router())
//!     .with_state(state);
//! ```
//!
//! # Specifications
//!
//! - [WS-Federation 1.2](https://docs.oasis-open.org/wsfed/federation/v1.2/ws-federation.html)
//! - [WS-Trust 1.3](https://docs.oasis-open.org/ws-sx/ws-trust/200512/ws-trust-1.3-os.html)
//! - [SAML 1.1 Core](https://www.oasis-open.org/committees/download.php/3406/oasis-sstc-saml-core-1.1.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod constants;
pub mod endpoints;
pub mod error;
pub mod interaction;
pub mod message;
pub mod response;
pub mod signature;
pub mod token;
pub mod validation;

pub use error::{WsFederationError, WsFederationResult};
pub use message::WsFederationMessage;
pub use validation::{
    ValidatedWsFederationRequest, ValidationResult, WsFederationRequestValidator,
};
