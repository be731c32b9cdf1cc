//! Axum endpoints for the WS-Federation passive profile.
//!
//! The host mounts [`wsfederation_router`] and supplies a
//! [`FederationHostProvider`]; everything protocol-specific stays behind
//! these handlers.

pub mod in_memory;
pub mod metadata;
pub mod router;
pub mod signin;
pub mod signout;
pub mod state;

pub use in_memory::InMemoryHostProvider;
pub use router::{paths, wsfederation_router};
pub use state::{
    FederationHostProvider, HostError, HostResult, LogoutNotification, WsFederationState,
};
