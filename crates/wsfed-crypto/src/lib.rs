//! Cryptographic primitives for WS-Federation token and metadata signing.
//!
//! Signing uses RSA PKCS#1 v1.5 over SHA-2, the profile the installed base
//! of WS-Federation relying parties (SharePoint, WIF-era SPs, older
//! Shibboleth deployments) actually verifies. All digest and signature
//! operations run on [aws-lc-rs].
//!
//! [aws-lc-rs]: https://docs.rs/aws-lc-rs

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod signing;

pub use algorithm::{
    DigestAlgorithm, EncryptionAlgorithm, KeyWrapAlgorithm, SignatureAlgorithm,
};
pub use signing::{
    CryptoError, CryptoResult, certificate_thumbprint, digest, rsa_sign, rsa_verify, sha256,
};
