//! Federation router configuration.
//!
//! Provides the Axum router for the WS-Federation endpoints.

use axum::Router;
use axum::routing::get;

use super::metadata::metadata;
use super::signin::{federation_get, federation_post, signin_callback};
use super::signout::signout_cleanup;
use super::state::{FederationHostProvider, WsFederationState};

/// Endpoint paths, relative to the mount point.
pub mod paths {
    /// Main federation endpoint: sign-in and sign-out dispatch on `wa`.
    pub const FEDERATION: &str = "/wsfederation";
    /// Sign-in resumption after the host login round trip.
    pub const CALLBACK: &str = "/wsfederation/callback";
    /// Host-initiated sign-out cleanup entry.
    pub const SIGN_OUT: &str = "/wsfederation/signout";
    /// Federation metadata document.
    pub const METADATA: &str = "/wsfederation/metadata";
}

/// Creates the WS-Federation protocol router.
///
/// # Endpoints
///
/// | Method    | Path                      | Behavior                           |
/// |-----------|---------------------------|------------------------------------|
/// | GET, POST | `/wsfederation`           | sign-in / sign-out dispatch on `wa`|
/// | GET       | `/wsfederation/callback`  | resume sign-in after host login    |
/// | GET       | `/wsfederation/signout`   | sign-out cleanup entry             |
/// | GET       | `/wsfederation/metadata`  | federation metadata document       |
///
/// POST to the main endpoint must be `application/x-www-form-urlencoded`;
/// other content types are rejected with 415. Methods outside the table
/// get a 405 from the router.
///
/// # Usage
///
/// ```rust,ignore
/// use wsfed_protocol::endpoints::{wsfederation_router, WsFederationState};
///
/// let state = WsFederationState::new(provider, options, relying_parties);
/// let app = Router::new()
///     .merge(wsfederation_router())
///     .with_state(state);
/// ```
pub fn wsfederation_router<P: FederationHostProvider>() -> Router<WsFederationState<P>> {
    Router::new()
        .route(
            paths::FEDERATION,
            get(federation_get::<P>).post(federation_post::<P>),
        )
        .route(paths::CALLBACK, get(signin_callback::<P>))
        .route(paths::SIGN_OUT, get(signout_cleanup::<P>))
        .route(paths::METADATA, get(metadata::<P>))
}
