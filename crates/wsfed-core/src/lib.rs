//! Core configuration and audit plumbing for the WS-Federation plugin.
//!
//! The plugin runs inside an OpenID Connect identity-provider host and
//! adds passive-profile WS-Federation endpoints to it. This crate holds
//! what every other plugin crate needs: the options tree the host
//! configures the plugin with, and the audit event type raised back into
//! the host's event sink.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod event;

pub use config::{
    CspLevel, CspOptions, InputLengthRestrictions, MetadataOptions, WsFederationOptions,
};
pub use event::{FederationEvent, FederationEventBuilder, FederationEventType, EventOutcome};
