//! Relying-party configuration stores.
//!
//! The plugin reads per-relying-party settings through the
//! [`RelyingPartyStore`] trait. Two implementations ship here: an
//! in-memory store seeded at startup, and a no-op store for hosts that
//! serve every realm from plugin defaults. [`CachingRelyingPartyStore`]
//! wraps any store with a read-through cache that also remembers misses.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cache;
pub mod caching;
pub mod error;
pub mod in_memory;
pub mod no_op;
pub mod store;

pub use cache::{CachedLookup, MemoryRelyingPartyCache, RelyingPartyCache};
pub use caching::CachingRelyingPartyStore;
pub use error::{StoreError, StoreResult};
pub use in_memory::InMemoryRelyingPartyStore;
pub use no_op::NoOpRelyingPartyStore;
pub use store::RelyingPartyStore;
