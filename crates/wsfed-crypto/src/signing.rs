//! RSA signing and digest operations.

use aws_lc_rs::digest::{self, SHA256, SHA384, SHA512};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{
    self, RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
    RsaKeyPair, UnparsedPublicKey,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

use crate::algorithm::{DigestAlgorithm, SignatureAlgorithm};

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material could not be parsed.
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    /// The signing operation itself failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),
    /// Signature did not verify against the given key.
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Result alias for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Signs `data` with an RSA private key in PKCS#1 or PKCS#8 DER form.
///
/// Both encodings occur in the wild for host key material, so the PKCS#1
/// parse falls back to PKCS#8 before giving up.
pub fn rsa_sign(
    private_key_der: &[u8],
    data: &[u8],
    algorithm: SignatureAlgorithm,
) -> CryptoResult<Vec<u8>> {
    let key_pair = RsaKeyPair::from_der(private_key_der)
        .or_else(|_| RsaKeyPair::from_pkcs8(private_key_der))
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let encoding = match algorithm {
        SignatureAlgorithm::RsaSha256 => &signature::RSA_PKCS1_SHA256,
        SignatureAlgorithm::RsaSha384 => &signature::RSA_PKCS1_SHA384,
        SignatureAlgorithm::RsaSha512 => &signature::RSA_PKCS1_SHA512,
    };

    let rng = SystemRandom::new();
    let mut sig = vec![0u8; key_pair.public_modulus_len()];
    key_pair
        .sign(encoding, &rng, data, &mut sig)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    Ok(sig)
}

/// Verifies an RSA PKCS#1 v1.5 signature against a PKCS#1 DER public key.
pub fn rsa_verify(
    public_key_der: &[u8],
    data: &[u8],
    sig: &[u8],
    algorithm: SignatureAlgorithm,
) -> CryptoResult<()> {
    let params = match algorithm {
        SignatureAlgorithm::RsaSha256 => &RSA_PKCS1_2048_8192_SHA256,
        SignatureAlgorithm::RsaSha384 => &RSA_PKCS1_2048_8192_SHA384,
        SignatureAlgorithm::RsaSha512 => &RSA_PKCS1_2048_8192_SHA512,
    };
    UnparsedPublicKey::new(params, public_key_der)
        .verify(data, sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Computes a digest with the given algorithm.
#[must_use]
pub fn digest(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    let alg = match algorithm {
        DigestAlgorithm::Sha256 => &SHA256,
        DigestAlgorithm::Sha384 => &SHA384,
        DigestAlgorithm::Sha512 => &SHA512,
    };
    digest::digest(alg, data).as_ref().to_vec()
}

/// SHA-256 digest.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest(DigestAlgorithm::Sha256, data)
}

/// Derives a key identifier from a DER certificate: the base64url-encoded
/// SHA-256 thumbprint, as used for JWT `kid` headers.
#[must_use]
pub fn certificate_thumbprint(certificate_der: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(sha256(certificate_der))
}
