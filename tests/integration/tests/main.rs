//! WS-Federation endpoint integration tests.
//!
//! Each test boots the federation router on an ephemeral port backed by
//! an in-memory host provider and drives the passive profile over HTTP.

mod common;
mod metadata_endpoint;
mod sign_in;
mod sign_out;
