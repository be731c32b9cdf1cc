//! XML encryption of issued assertions.
//!
//! A relying party with an encryption certificate receives its assertion
//! as XML-Enc `EncryptedData`: the assertion is encrypted under a fresh
//! AES content key, the content key is wrapped for the certificate's RSA
//! public key, and the IV is prepended to the ciphertext inside
//! `CipherValue`, per the XML-Enc CBC profile.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use openssl::rand::rand_bytes;
use openssl::rsa::Padding;
use openssl::symm::Cipher;
use openssl::x509::X509;

use wsfed_crypto::{EncryptionAlgorithm, KeyWrapAlgorithm};
use wsfed_model::TokenType;

use crate::constants::namespaces;
use crate::error::{WsFederationError, WsFederationResult};

use super::EncryptionParameters;

const IV_LEN: usize = 16;

/// Encrypts a serialized assertion for the relying party's certificate.
///
/// SAML 2.0 output is wrapped in `saml:EncryptedAssertion`; SAML 1.1 has
/// no such element, so the bare `EncryptedData` replaces the assertion.
pub(crate) fn encrypt_assertion(
    xml: &str,
    parameters: &EncryptionParameters,
    token_type: TokenType,
) -> WsFederationResult<String> {
    let certificate = X509::from_der(&parameters.certificate_der)
        .map_err(|e| WsFederationError::Encryption(format!("bad encryption certificate: {e}")))?;
    let rsa = certificate
        .public_key()
        .and_then(|key| key.rsa())
        .map_err(|e| {
            WsFederationError::Encryption(format!("certificate has no RSA public key: {e}"))
        })?;

    let mut content_key = vec![0u8; parameters.encryption_algorithm.key_len()];
    rand_bytes(&mut content_key)
        .map_err(|e| WsFederationError::Encryption(e.to_string()))?;
    let mut iv = [0u8; IV_LEN];
    rand_bytes(&mut iv).map_err(|e| WsFederationError::Encryption(e.to_string()))?;

    let cipher = match parameters.encryption_algorithm {
        EncryptionAlgorithm::Aes128Cbc => Cipher::aes_128_cbc(),
        EncryptionAlgorithm::Aes256Cbc => Cipher::aes_256_cbc(),
    };
    let ciphertext = openssl::symm::encrypt(cipher, &content_key, Some(&iv), xml.as_bytes())
        .map_err(|e| WsFederationError::Encryption(e.to_string()))?;

    let mut cipher_value = Vec::with_capacity(IV_LEN + ciphertext.len());
    cipher_value.extend_from_slice(&iv);
    cipher_value.extend_from_slice(&ciphertext);

    let padding = match parameters.key_wrap_algorithm {
        KeyWrapAlgorithm::RsaOaep => Padding::PKCS1_OAEP,
        KeyWrapAlgorithm::Rsa15 => Padding::PKCS1,
    };
    let mut wrapped_key = vec![0u8; rsa.size() as usize];
    let wrapped_len = rsa
        .public_encrypt(&content_key, &mut wrapped_key, padding)
        .map_err(|e| WsFederationError::Encryption(format!("key wrap failed: {e}")))?;
    wrapped_key.truncate(wrapped_len);

    let encrypted_data = format!(
        "<xenc:EncryptedData xmlns:xenc=\"{}\" Type=\"{}Element\"><xenc:EncryptionMethod Algorithm=\"{}\"></xenc:EncryptionMethod><ds:KeyInfo xmlns:ds=\"{}\"><xenc:EncryptedKey><xenc:EncryptionMethod Algorithm=\"{}\"></xenc:EncryptionMethod><ds:KeyInfo><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo><xenc:CipherData><xenc:CipherValue>{}</xenc:CipherValue></xenc:CipherData></xenc:EncryptedKey></ds:KeyInfo><xenc:CipherData><xenc:CipherValue>{}</xenc:CipherValue></xenc:CipherData></xenc:EncryptedData>",
        namespaces::XML_ENC,
        namespaces::XML_ENC,
        parameters.encryption_algorithm.uri(),
        namespaces::XML_DSIG,
        parameters.key_wrap_algorithm.uri(),
        BASE64.encode(&parameters.certificate_der),
        BASE64.encode(&wrapped_key),
        BASE64.encode(&cipher_value),
    );

    Ok(match token_type {
        TokenType::Saml2 => format!(
            "<saml:EncryptedAssertion xmlns:saml=\"{}\">{}</saml:EncryptedAssertion>",
            namespaces::SAML2_ASSERTION,
            encrypted_data,
        ),
        _ => encrypted_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::hash::MessageDigest;
    use openssl::pkey::{PKey, Private};
    use openssl::rsa::Rsa;
    use openssl::x509::{X509Builder, X509NameBuilder};

    fn recipient_certificate() -> (PKey<Private>, Vec<u8>) {
        let rsa = Rsa::generate(2048).unwrap();
        let key = PKey::from_rsa(rsa).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "rp.example.com").unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap();
        builder
            .set_serial_number(&serial.to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(365).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        (key, builder.build().to_der().unwrap())
    }

    fn parameters(certificate_der: Vec<u8>) -> EncryptionParameters {
        EncryptionParameters {
            certificate_der,
            encryption_algorithm: EncryptionAlgorithm::Aes256Cbc,
            key_wrap_algorithm: KeyWrapAlgorithm::RsaOaep,
        }
    }

    /// Pulls base64 CipherValue contents in document order: the wrapped
    /// key comes first, the content second.
    fn cipher_values(xml: &str) -> Vec<Vec<u8>> {
        let mut values = Vec::new();
        let mut rest = xml;
        while let Some(start) = rest.find("<xenc:CipherValue>") {
            let after = &rest[start + "<xenc:CipherValue>".len()..];
            let end = after.find("</xenc:CipherValue>").unwrap();
            values.push(BASE64.decode(&after[..end]).unwrap());
            rest = &after[end..];
        }
        values
    }

    #[test]
    fn round_trip_decrypts_to_original() {
        let (key, cert_der) = recipient_certificate();
        let plain = "<saml:Assertion ID=\"_x\">payload</saml:Assertion>";

        let encrypted =
            encrypt_assertion(plain, &parameters(cert_der), TokenType::Saml11).unwrap();
        let values = cipher_values(&encrypted);
        assert_eq!(values.len(), 2);

        let rsa = key.rsa().unwrap();
        let mut content_key = vec![0u8; rsa.size() as usize];
        let len = rsa
            .private_decrypt(&values[0], &mut content_key, Padding::PKCS1_OAEP)
            .unwrap();
        content_key.truncate(len);
        assert_eq!(content_key.len(), 32);

        let (iv, ciphertext) = values[1].split_at(IV_LEN);
        let decrypted = openssl::symm::decrypt(
            Cipher::aes_256_cbc(),
            &content_key,
            Some(iv),
            ciphertext,
        )
        .unwrap();
        assert_eq!(String::from_utf8(decrypted).unwrap(), plain);
    }

    #[test]
    fn saml2_wraps_in_encrypted_assertion() {
        let (_, cert_der) = recipient_certificate();
        let encrypted =
            encrypt_assertion("<a>x</a>", &parameters(cert_der), TokenType::Saml2).unwrap();
        assert!(encrypted.starts_with(
            "<saml:EncryptedAssertion xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\">"
        ));
        assert!(encrypted.ends_with("</saml:EncryptedAssertion>"));
    }

    #[test]
    fn saml11_stays_bare_encrypted_data() {
        let (_, cert_der) = recipient_certificate();
        let encrypted =
            encrypt_assertion("<a>x</a>", &parameters(cert_der), TokenType::Saml11).unwrap();
        assert!(encrypted.starts_with("<xenc:EncryptedData"));
    }

    #[test]
    fn algorithm_uris_are_advertised() {
        let (_, cert_der) = recipient_certificate();
        let mut params = parameters(cert_der);
        params.encryption_algorithm = EncryptionAlgorithm::Aes128Cbc;
        params.key_wrap_algorithm = KeyWrapAlgorithm::Rsa15;

        let encrypted = encrypt_assertion("<a>x</a>", &params, TokenType::Saml11).unwrap();
        assert!(encrypted.contains("http://www.w3.org/2001/04/xmlenc#aes128-cbc"));
        assert!(encrypted.contains("http://www.w3.org/2001/04/xmlenc#rsa-1_5"));
    }

    #[test]
    fn garbage_certificate_is_rejected() {
        let err = encrypt_assertion("<a>x</a>", &parameters(vec![1, 2, 3]), TokenType::Saml11)
            .unwrap_err();
        assert!(matches!(err, WsFederationError::Encryption(_)));
    }
}
