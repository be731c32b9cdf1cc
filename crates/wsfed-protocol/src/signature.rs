//! Enveloped XML signatures.
//!
//! Signs assertions and metadata with XML-DSig enveloped signatures. The
//! signer operates on the serialized form the generators in this crate
//! produce: single line, fixed attribute order, expanded end tags. That
//! form is already canonical, so the digest input equals what an
//! exclusive-C14N verifier computes, without a canonicalization pass
//! here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use wsfed_crypto::{DigestAlgorithm, SignatureAlgorithm};

use crate::constants::{namespaces, transforms};
use crate::error::{WsFederationError, WsFederationResult};

/// The host's signing key and certificate, DER encoded.
///
/// The private key may be PKCS#1 or PKCS#8; the certificate is X.509.
#[derive(Clone)]
pub struct SigningMaterial {
    /// RSA private key, DER.
    pub private_key_der: Vec<u8>,
    /// X.509 certificate, DER.
    pub certificate_der: Vec<u8>,
}

impl std::fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("private_key_der", &"[redacted]")
            .field("certificate_der", &format!("{} bytes", self.certificate_der.len()))
            .finish()
    }
}

/// Where the `Signature` element lands inside the signed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePlacement {
    /// First child of the document element. Used for metadata.
    FirstChild,
    /// Immediately after the named closing tag. SAML 2.0 wants the
    /// signature after `</saml:Issuer>`.
    After(&'static str),
    /// Last child of the document element. SAML 1.1 schema order.
    LastChild,
}

/// XML document signer.
pub struct XmlSigner {
    material: SigningMaterial,
    signature_algorithm: SignatureAlgorithm,
    digest_algorithm: DigestAlgorithm,
}

impl XmlSigner {
    /// Creates a signer for the given material and algorithms.
    #[must_use]
    pub fn new(
        material: SigningMaterial,
        signature_algorithm: SignatureAlgorithm,
        digest_algorithm: DigestAlgorithm,
    ) -> Self {
        Self {
            material,
            signature_algorithm,
            digest_algorithm,
        }
    }

    /// Signs `xml` with an enveloped signature referencing
    /// `#reference_id`, inserting the `Signature` element at `placement`.
    ///
    /// The digest covers the document as passed in; with the enveloped
    /// transform, inserting the signature afterwards leaves the digest
    /// valid.
    pub fn sign(
        &self,
        xml: &str,
        reference_id: &str,
        placement: SignaturePlacement,
    ) -> WsFederationResult<String> {
        let digest = wsfed_crypto::digest(self.digest_algorithm, xml.as_bytes());
        let digest_b64 = BASE64.encode(digest);

        let signed_info = build_signed_info(
            reference_id,
            &digest_b64,
            self.signature_algorithm,
            self.digest_algorithm,
        );

        let signature_value = wsfed_crypto::rsa_sign(
            &self.material.private_key_der,
            signed_info.as_bytes(),
            self.signature_algorithm,
        )
        .map_err(|e| WsFederationError::Signature(e.to_string()))?;
        let signature_b64 = BASE64.encode(signature_value);

        let certificate_b64 = BASE64.encode(&self.material.certificate_der);
        let signature_element =
            build_signature_element(&signed_info, &signature_b64, &certificate_b64);

        let position = insert_position(xml, placement)?;
        Ok(format!(
            "{}{}{}",
            &xml[..position],
            signature_element,
            &xml[position..]
        ))
    }
}

/// Builds the `SignedInfo` element in canonical shape.
fn build_signed_info(
    reference_id: &str,
    digest_b64: &str,
    signature_algorithm: SignatureAlgorithm,
    digest_algorithm: DigestAlgorithm,
) -> String {
    format!(
        "<SignedInfo xmlns=\"{dsig}\">\
<CanonicalizationMethod Algorithm=\"{c14n}\"></CanonicalizationMethod>\
<SignatureMethod Algorithm=\"{sig_alg}\"></SignatureMethod>\
<Reference URI=\"#{reference_id}\">\
<Transforms>\
<Transform Algorithm=\"{enveloped}\"></Transform>\
<Transform Algorithm=\"{c14n}\"></Transform>\
</Transforms>\
<DigestMethod Algorithm=\"{digest_alg}\"></DigestMethod>\
<DigestValue>{digest_b64}</DigestValue>\
</Reference>\
</SignedInfo>",
        dsig = namespaces::XML_DSIG,
        c14n = transforms::EXCLUSIVE_C14N,
        enveloped = transforms::ENVELOPED_SIGNATURE,
        sig_alg = signature_algorithm.uri(),
        digest_alg = digest_algorithm.uri(),
    )
}

/// Builds the complete `Signature` element.
fn build_signature_element(
    signed_info: &str,
    signature_b64: &str,
    certificate_b64: &str,
) -> String {
    format!(
        "<Signature xmlns=\"{dsig}\">\
{signed_info}\
<SignatureValue>{signature_b64}</SignatureValue>\
<KeyInfo>\
<X509Data>\
<X509Certificate>{certificate_b64}</X509Certificate>\
</X509Data>\
</KeyInfo>\
</Signature>",
        dsig = namespaces::XML_DSIG,
    )
}

/// Resolves the byte offset for the requested placement.
fn insert_position(xml: &str, placement: SignaturePlacement) -> WsFederationResult<usize> {
    match placement {
        SignaturePlacement::FirstChild => {
            // Skip an XML declaration before looking for the root tag.
            let search_from = xml.find("?>").map_or(0, |pos| pos + 2);
            xml[search_from..]
                .find('>')
                .map(|pos| search_from + pos + 1)
                .ok_or_else(|| {
                    WsFederationError::Signature("document has no root element".to_string())
                })
        }
        SignaturePlacement::After(closing_tag) => xml
            .find(closing_tag)
            .map(|pos| pos + closing_tag.len())
            .ok_or_else(|| {
                WsFederationError::Signature(format!("missing {closing_tag} for placement"))
            }),
        SignaturePlacement::LastChild => xml.rfind("</").ok_or_else(|| {
            WsFederationError::Signature("document has no closing tag".to_string())
        }),
    }
}
