//! Store error types.

use thiserror::Error;

/// Errors raised by relying-party stores and caches.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Two seeded relying parties share a realm.
    #[error("duplicate relying party realm: {0}")]
    DuplicateRealm(String),

    /// A relying party's claim mapping lists a source type twice.
    #[error("duplicate claim mapping source '{source}' for realm {realm}")]
    DuplicateMappingSource {
        /// Realm of the offending relying party.
        realm: String,
        /// The repeated source claim type.
        r#source: String,
    },

    /// The cache layer failed.
    #[error("relying party cache failure: {0}")]
    Cache(String),

    /// The backing store failed.
    #[error("relying party store failure: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
