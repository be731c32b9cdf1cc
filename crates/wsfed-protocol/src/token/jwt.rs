//! JWT issuance.
//!
//! WS-Federation predates JWTs, but modern relying parties accept them
//! inside `wsse:BinarySecurityToken` elements. The handler flattens the
//! mapped claim set back to short JWT claim names where a well-known name
//! exists and keeps the full URI as the key otherwise.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Map, Value};
use tracing::warn;

use wsfed_crypto::{SignatureAlgorithm, certificate_thumbprint};
use wsfed_model::TokenType;
use wsfed_model::claim::claim_types;

use crate::constants::authentication_methods;
use crate::error::{WsFederationError, WsFederationResult};

use super::{IssuedToken, SecurityTokenDescriptor};

/// JWT claim names for the WS-* claim types that have one.
const OUTBOUND_CLAIM_MAP: &[(&str, &str)] = &[
    (claim_types::NAME_IDENTIFIER, "sub"),
    (claim_types::NAME, "name"),
    (claim_types::GIVEN_NAME, "given_name"),
    (claim_types::SURNAME, "family_name"),
    (claim_types::EMAIL_ADDRESS, "email"),
    (claim_types::DATE_OF_BIRTH, "birthdate"),
    (claim_types::WEBPAGE, "website"),
    (claim_types::GENDER, "gender"),
    (claim_types::ROLE, "role"),
];

/// Issues RS256/384/512-signed JWTs.
///
/// The private key must be PKCS#1 DER; that is the only DER form
/// `jsonwebtoken` accepts for RSA keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JwtTokenHandler;

impl JwtTokenHandler {
    /// Creates the handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Mints a signed JWT from the descriptor.
    ///
    /// XML encryption does not apply to JWTs; a relying party configured
    /// with an encryption certificate gets the token in the clear, with
    /// a warning in the log.
    pub fn create_token(
        &self,
        descriptor: &SecurityTokenDescriptor,
    ) -> WsFederationResult<IssuedToken> {
        if descriptor.encryption.is_some() {
            warn!(
                audience = %descriptor.audience,
                "relying party has an encryption certificate; JWT tokens are issued unencrypted"
            );
        }

        let payload = build_payload(descriptor);

        let mut header = Header::new(jwt_algorithm(descriptor.signature_algorithm));
        header.typ = Some("JWT".to_string());
        let thumbprint = certificate_thumbprint(&descriptor.signing.certificate_der);
        header.kid = Some(thumbprint.clone());
        header.x5t_s256 = Some(thumbprint);

        let encoding_key = EncodingKey::from_rsa_der(&descriptor.signing.private_key_der);
        let token = encode(&header, &payload, &encoding_key)
            .map_err(|e| WsFederationError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            token_type: TokenType::Jwt,
            content: token,
        })
    }
}

fn build_payload(descriptor: &SecurityTokenDescriptor) -> Map<String, Value> {
    let mut payload = Map::new();

    for claim in &descriptor.claims {
        // Authentication claims come from the descriptor as amr/auth_time.
        if matches!(
            claim.claim_type.as_str(),
            claim_types::AUTHENTICATION_METHOD | claim_types::AUTHENTICATION_INSTANT
        ) {
            continue;
        }
        let key = OUTBOUND_CLAIM_MAP
            .iter()
            .find(|(uri, _)| *uri == claim.claim_type)
            .map_or(claim.claim_type.as_str(), |(_, name)| name);
        insert_claim(&mut payload, key, Value::String(claim.value.clone()));
    }

    payload.insert(
        "iss".to_string(),
        Value::String(descriptor.issuer.clone()),
    );
    payload.insert(
        "aud".to_string(),
        Value::String(descriptor.audience.clone()),
    );
    payload.insert("nbf".to_string(), Value::from(descriptor.created.timestamp()));
    payload.insert("iat".to_string(), Value::from(descriptor.created.timestamp()));
    payload.insert("exp".to_string(), Value::from(descriptor.expires.timestamp()));

    if let Some(authentication) = descriptor.authentication.as_ref() {
        let amr = if authentication.method == authentication_methods::PASSWORD {
            "pwd"
        } else {
            authentication.method.as_str()
        };
        payload.insert(
            "amr".to_string(),
            Value::Array(vec![Value::String(amr.to_string())]),
        );
        payload.insert(
            "auth_time".to_string(),
            Value::from(authentication.instant.timestamp()),
        );
    }

    payload
}

/// Repeated claim keys collect into a JSON array.
fn insert_claim(payload: &mut Map<String, Value>, key: &str, value: Value) {
    match payload.get_mut(key) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            payload.insert(key.to_string(), value);
        }
    }
}

const fn jwt_algorithm(algorithm: SignatureAlgorithm) -> Algorithm {
    match algorithm {
        SignatureAlgorithm::RsaSha256 => Algorithm::RS256,
        SignatureAlgorithm::RsaSha384 => Algorithm::RS384,
        SignatureAlgorithm::RsaSha512 => Algorithm::RS512,
    }
}
