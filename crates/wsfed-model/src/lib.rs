//! Domain models shared across the WS-Federation plugin.
//!
//! These types describe the host's view of clients, the plugin's
//! per-relying-party settings, authenticated subjects, and the claims
//! flowing into issued tokens. Everything here is plain data; behavior
//! lives in the protocol crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod claim;
pub mod client;
pub mod relying_party;
pub mod subject;
pub mod token;

pub use claim::Claim;
pub use client::{FederationClient, ProtocolType};
pub use relying_party::RelyingParty;
pub use subject::AuthenticatedSubject;
pub use token::{TokenType, WsTrustVersion};
