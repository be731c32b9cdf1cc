//! SAML 1.1 and SAML 2.0 assertion issuance.
//!
//! Both flavors share one handler; the differences are element names,
//! where the subject lives, and where the signature goes. SAML 1.1 nests
//! the subject inside each statement and takes the signature as the last
//! child; SAML 2.0 hoists the subject to the assertion and wants the
//! signature right after `Issuer`.
//!
//! Output is a single line with expanded end tags. That keeps the
//! serialized form canonical so the enveloped signature verifies without
//! a second canonicalization pass on the relying-party side.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use wsfed_model::claim::{claim_properties, claim_types};
use wsfed_model::{Claim, TokenType};

use crate::constants::{INSTANT_FORMAT, authentication_methods, namespaces};
use crate::error::{WsFederationError, WsFederationResult};
use crate::signature::{SignaturePlacement, XmlSigner};

use super::{IssuedToken, SecurityTokenDescriptor, encryption, xml_escape};

const SAML11_BEARER: &str = "urn:oasis:names:tc:SAML:1.0:cm:bearer";
const SAML2_BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";
const SAML2_PASSWORD_CONTEXT: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:Password";
const SAML2_UNSPECIFIED_CONTEXT: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:unspecified";

/// Issues signed, optionally encrypted SAML assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamlTokenHandler {
    token_type: TokenType,
}

impl SamlTokenHandler {
    /// Creates a SAML 1.1 handler.
    #[must_use]
    pub const fn saml11() -> Self {
        Self {
            token_type: TokenType::Saml11,
        }
    }

    /// Creates a SAML 2.0 handler.
    #[must_use]
    pub const fn saml2() -> Self {
        Self {
            token_type: TokenType::Saml2,
        }
    }

    /// The token type this handler produces.
    #[must_use]
    pub const fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Builds, signs, and (when configured) encrypts an assertion.
    pub fn create_token(
        &self,
        descriptor: &SecurityTokenDescriptor,
    ) -> WsFederationResult<IssuedToken> {
        let assertion_id = format!("_{}", Uuid::new_v4());
        let (unsigned, placement) = match self.token_type {
            TokenType::Saml11 => (
                build_saml11_assertion(&assertion_id, descriptor)?,
                SignaturePlacement::LastChild,
            ),
            TokenType::Saml2 => (
                build_saml2_assertion(&assertion_id, descriptor)?,
                SignaturePlacement::After("</saml:Issuer>"),
            ),
            TokenType::Jwt => {
                return Err(WsFederationError::Internal(
                    "SAML handler cannot issue JWT tokens".to_string(),
                ));
            }
        };

        let signer = XmlSigner::new(
            descriptor.signing.clone(),
            descriptor.signature_algorithm,
            descriptor.digest_algorithm,
        );
        let signed = signer.sign(&unsigned, &assertion_id, placement)?;

        let content = match descriptor.encryption.as_ref() {
            Some(parameters) => {
                encryption::encrypt_assertion(&signed, parameters, self.token_type)?
            }
            None => signed,
        };

        Ok(IssuedToken {
            token_type: self.token_type,
            content,
        })
    }
}

fn build_saml11_assertion(
    assertion_id: &str,
    descriptor: &SecurityTokenDescriptor,
) -> WsFederationResult<String> {
    let name_identifier = name_identifier_claim(&descriptor.claims)?;
    let subject = saml11_subject(name_identifier);

    let mut statements = String::new();
    if let Some(authentication) = descriptor.authentication.as_ref() {
        statements.push_str(&format!(
            "<saml:AuthenticationStatement AuthenticationMethod=\"{}\" AuthenticationInstant=\"{}\">{}</saml:AuthenticationStatement>",
            xml_escape(&authentication.method),
            format_instant(authentication.instant),
            subject,
        ));
    }

    let attributes = grouped_attribute_claims(&descriptor.claims);
    if !attributes.is_empty() {
        statements.push_str("<saml:AttributeStatement>");
        statements.push_str(&subject);
        for (claim_type, values) in &attributes {
            let (namespace, name) = split_saml11_attribute(claim_type);
            statements.push_str(&format!(
                "<saml:Attribute AttributeName=\"{}\" AttributeNamespace=\"{}\">",
                xml_escape(name),
                xml_escape(namespace),
            ));
            for value in values {
                statements.push_str(&format!(
                    "<saml:AttributeValue>{}</saml:AttributeValue>",
                    xml_escape(value)
                ));
            }
            statements.push_str("</saml:Attribute>");
        }
        statements.push_str("</saml:AttributeStatement>");
    }

    // The SAML 1.1 subject only exists inside statements; an assertion
    // without any cannot identify anyone.
    if statements.is_empty() {
        return Err(WsFederationError::TokenCreation(
            "a SAML 1.1 assertion needs at least one statement".to_string(),
        ));
    }

    Ok(format!(
        "<saml:Assertion xmlns:saml=\"{}\" MajorVersion=\"1\" MinorVersion=\"1\" AssertionID=\"{}\" Issuer=\"{}\" IssueInstant=\"{}\"><saml:Conditions NotBefore=\"{}\" NotOnOrAfter=\"{}\"><saml:AudienceRestrictionCondition><saml:Audience>{}</saml:Audience></saml:AudienceRestrictionCondition></saml:Conditions>{}</saml:Assertion>",
        namespaces::SAML11_ASSERTION,
        assertion_id,
        xml_escape(&descriptor.issuer),
        format_instant(descriptor.created),
        format_instant(descriptor.created),
        format_instant(descriptor.expires),
        xml_escape(&descriptor.audience),
        statements,
    ))
}

fn build_saml2_assertion(
    assertion_id: &str,
    descriptor: &SecurityTokenDescriptor,
) -> WsFederationResult<String> {
    let name_identifier = name_identifier_claim(&descriptor.claims)?;
    let name_id = match name_identifier.property(claim_properties::FORMAT) {
        Some(format) => format!(
            "<saml:NameID Format=\"{}\">{}</saml:NameID>",
            xml_escape(format),
            xml_escape(&name_identifier.value),
        ),
        None => format!(
            "<saml:NameID>{}</saml:NameID>",
            xml_escape(&name_identifier.value)
        ),
    };

    let mut statements = String::new();
    if let Some(authentication) = descriptor.authentication.as_ref() {
        let context_class = if authentication.method == authentication_methods::PASSWORD {
            SAML2_PASSWORD_CONTEXT
        } else {
            SAML2_UNSPECIFIED_CONTEXT
        };
        statements.push_str(&format!(
            "<saml:AuthnStatement AuthnInstant=\"{}\"><saml:AuthnContext><saml:AuthnContextClassRef>{}</saml:AuthnContextClassRef></saml:AuthnContext></saml:AuthnStatement>",
            format_instant(authentication.instant),
            context_class,
        ));
    }

    let attributes = grouped_attribute_claims(&descriptor.claims);
    if !attributes.is_empty() {
        statements.push_str("<saml:AttributeStatement>");
        for (claim_type, values) in &attributes {
            statements.push_str(&format!(
                "<saml:Attribute Name=\"{}\">",
                xml_escape(claim_type)
            ));
            for value in values {
                statements.push_str(&format!(
                    "<saml:AttributeValue>{}</saml:AttributeValue>",
                    xml_escape(value)
                ));
            }
            statements.push_str("</saml:Attribute>");
        }
        statements.push_str("</saml:AttributeStatement>");
    }

    Ok(format!(
        "<saml:Assertion xmlns:saml=\"{}\" ID=\"{}\" Version=\"2.0\" IssueInstant=\"{}\"><saml:Issuer>{}</saml:Issuer><saml:Subject>{}<saml:SubjectConfirmation Method=\"{}\"><saml:SubjectConfirmationData NotOnOrAfter=\"{}\"></saml:SubjectConfirmationData></saml:SubjectConfirmation></saml:Subject><saml:Conditions NotBefore=\"{}\" NotOnOrAfter=\"{}\"><saml:AudienceRestriction><saml:Audience>{}</saml:Audience></saml:AudienceRestriction></saml:Conditions>{}</saml:Assertion>",
        namespaces::SAML2_ASSERTION,
        assertion_id,
        format_instant(descriptor.created),
        xml_escape(&descriptor.issuer),
        name_id,
        SAML2_BEARER,
        format_instant(descriptor.expires),
        format_instant(descriptor.created),
        format_instant(descriptor.expires),
        xml_escape(&descriptor.audience),
        statements,
    ))
}

fn saml11_subject(name_identifier: &Claim) -> String {
    let identifier = match name_identifier.property(claim_properties::FORMAT) {
        Some(format) => format!(
            "<saml:NameIdentifier Format=\"{}\">{}</saml:NameIdentifier>",
            xml_escape(format),
            xml_escape(&name_identifier.value),
        ),
        None => format!(
            "<saml:NameIdentifier>{}</saml:NameIdentifier>",
            xml_escape(&name_identifier.value)
        ),
    };
    format!(
        "<saml:Subject>{identifier}<saml:SubjectConfirmation><saml:ConfirmationMethod>{SAML11_BEARER}</saml:ConfirmationMethod></saml:SubjectConfirmation></saml:Subject>"
    )
}

fn name_identifier_claim(claims: &[Claim]) -> WsFederationResult<&Claim> {
    claims
        .iter()
        .find(|c| c.claim_type == claim_types::NAME_IDENTIFIER)
        .ok_or_else(|| {
            WsFederationError::TokenCreation(
                "assertion requires a name-identifier claim".to_string(),
            )
        })
}

/// Claims that become attributes, grouped by type in first-seen order.
///
/// The name identifier and the authentication claims stay out: they are
/// already represented by the subject and the authentication statement.
fn grouped_attribute_claims(claims: &[Claim]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for claim in claims {
        if matches!(
            claim.claim_type.as_str(),
            claim_types::NAME_IDENTIFIER
                | claim_types::AUTHENTICATION_METHOD
                | claim_types::AUTHENTICATION_INSTANT
        ) {
            continue;
        }
        match groups.iter_mut().find(|(t, _)| *t == claim.claim_type) {
            Some((_, values)) => values.push(claim.value.clone()),
            None => groups.push((claim.claim_type.clone(), vec![claim.value.clone()])),
        }
    }
    groups
}

/// Splits a claim-type URI into SAML 1.1 attribute namespace and name at
/// the last `/`. Types without one (which the claim mapping filters out)
/// fall back to an empty namespace.
fn split_saml11_attribute(claim_type: &str) -> (&str, &str) {
    match claim_type.rfind('/') {
        Some(index) => (&claim_type[..index], &claim_type[index + 1..]),
        None => ("", claim_type),
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

/// One authentication statement read back out of an assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationStatement {
    /// SAML 1.1 authentication method or SAML 2.0 context class.
    pub method: String,
    /// Statement instant, as serialized.
    pub instant: String,
}

/// Reads the authentication statements out of an issued assertion.
///
/// Works on both SAML flavors. This is a verification aid for hosts and
/// tests; issuance never parses its own output.
pub fn read_authentication_statements(
    xml: &str,
) -> WsFederationResult<Vec<AuthenticationStatement>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut statements = Vec::new();
    let mut pending_instant: Option<String> = None;
    let mut in_context_class = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"AuthenticationStatement" => {
                        let method = attribute_value(&e, b"AuthenticationMethod");
                        let instant = attribute_value(&e, b"AuthenticationInstant");
                        if let (Some(method), Some(instant)) = (method, instant) {
                            statements.push(AuthenticationStatement { method, instant });
                        }
                    }
                    b"AuthnStatement" => {
                        pending_instant = attribute_value(&e, b"AuthnInstant");
                    }
                    b"AuthnContextClassRef" => {
                        in_context_class = true;
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_context_class
                    && let Some(instant) = pending_instant.take()
                {
                    let method = e.unescape().unwrap_or_default().to_string();
                    statements.push(AuthenticationStatement { method, instant });
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"AuthnContextClassRef" {
                    in_context_class = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WsFederationError::TokenCreation(format!(
                    "assertion XML parse error: {e}"
                )));
            }
            _ => {}
        }
    }

    Ok(statements)
}

fn attribute_value(e: &quick_xml::events::BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::AuthenticationInformation;
    use chrono::Duration;
    use wsfed_crypto::{DigestAlgorithm, SignatureAlgorithm};
    use wsfed_model::claim::name_id_formats;

    use crate::signature::SigningMaterial;

    fn descriptor(claims: Vec<Claim>) -> SecurityTokenDescriptor {
        let created = Utc::now();
        SecurityTokenDescriptor {
            issuer: "https://idp.example.com".to_string(),
            audience: "urn:sample:rp".to_string(),
            claims,
            created,
            expires: created + Duration::seconds(300),
            signing: SigningMaterial {
                private_key_der: Vec::new(),
                certificate_der: Vec::new(),
            },
            signature_algorithm: SignatureAlgorithm::RsaSha256,
            digest_algorithm: DigestAlgorithm::Sha256,
            authentication: Some(AuthenticationInformation {
                method: authentication_methods::PASSWORD.to_string(),
                instant: created,
            }),
            encryption: None,
        }
    }

    fn subject_claims() -> Vec<Claim> {
        vec![
            Claim::new(claim_types::NAME_IDENTIFIER, "alice")
                .with_property(claim_properties::FORMAT, name_id_formats::UNSPECIFIED),
            Claim::new(claim_types::EMAIL_ADDRESS, "alice@example.com"),
            Claim::new(claim_types::ROLE, "admin"),
            Claim::new(claim_types::ROLE, "auditor"),
        ]
    }

    #[test]
    fn saml11_assertion_shape() {
        let xml = build_saml11_assertion("_abc", &descriptor(subject_claims())).unwrap();

        assert!(xml.starts_with("<saml:Assertion xmlns:saml=\"urn:oasis:names:tc:SAML:1.0:assertion\""));
        assert!(xml.contains("MajorVersion=\"1\" MinorVersion=\"1\""));
        assert!(xml.contains("AssertionID=\"_abc\""));
        assert!(xml.contains("<saml:AudienceRestrictionCondition><saml:Audience>urn:sample:rp</saml:Audience>"));
        assert!(xml.contains("AuthenticationMethod=\"urn:oasis:names:tc:SAML:1.0:am:password\""));
        // Subject appears in both statements.
        assert_eq!(xml.matches("<saml:NameIdentifier").count(), 2);
        // No self-closing tags; the signer depends on expanded end tags.
        assert!(!xml.contains("/>"));
    }

    #[test]
    fn saml11_groups_repeated_claim_types() {
        let xml = build_saml11_assertion("_abc", &descriptor(subject_claims())).unwrap();
        assert_eq!(xml.matches("AttributeName=\"role\"").count(), 1);
        assert!(xml.contains(
            "<saml:AttributeValue>admin</saml:AttributeValue><saml:AttributeValue>auditor</saml:AttributeValue>"
        ));
    }

    #[test]
    fn saml11_attribute_namespace_split() {
        let xml = build_saml11_assertion("_abc", &descriptor(subject_claims())).unwrap();
        assert!(xml.contains(
            "AttributeName=\"emailaddress\" AttributeNamespace=\"http://schemas.xmlsoap.org/ws/2005/05/identity/claims\""
        ));
    }

    #[test]
    fn saml11_without_statements_is_rejected() {
        let mut d = descriptor(vec![Claim::new(claim_types::NAME_IDENTIFIER, "alice")]);
        d.authentication = None;
        let err = build_saml11_assertion("_abc", &d).unwrap_err();
        assert!(matches!(err, WsFederationError::TokenCreation(_)));
    }

    #[test]
    fn saml2_assertion_shape() {
        let xml = build_saml2_assertion("_abc", &descriptor(subject_claims())).unwrap();

        assert!(xml.starts_with("<saml:Assertion xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\""));
        assert!(xml.contains("ID=\"_abc\" Version=\"2.0\""));
        assert!(xml.contains("<saml:Issuer>https://idp.example.com</saml:Issuer>"));
        assert!(xml.contains("<saml:NameID Format=\"urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified\">alice</saml:NameID>"));
        assert!(xml.contains("Method=\"urn:oasis:names:tc:SAML:2.0:cm:bearer\""));
        assert!(xml.contains("<saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:Password</saml:AuthnContextClassRef>"));
        assert!(xml.contains("<saml:Attribute Name=\"http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress\">"));
        assert!(!xml.contains("/>"));
    }

    #[test]
    fn saml2_non_password_method_maps_to_unspecified_context() {
        let mut d = descriptor(subject_claims());
        d.authentication = Some(AuthenticationInformation {
            method: authentication_methods::UNSPECIFIED.to_string(),
            instant: Utc::now(),
        });
        let xml = build_saml2_assertion("_abc", &d).unwrap();
        assert!(xml.contains(SAML2_UNSPECIFIED_CONTEXT));
        assert!(!xml.contains(SAML2_PASSWORD_CONTEXT));
    }

    #[test]
    fn missing_name_identifier_is_rejected() {
        let d = descriptor(vec![Claim::new(claim_types::EMAIL_ADDRESS, "a@b.c")]);
        assert!(build_saml11_assertion("_abc", &d).is_err());
        assert!(build_saml2_assertion("_abc", &d).is_err());
    }

    #[test]
    fn attribute_values_are_escaped() {
        let claims = vec![
            Claim::new(claim_types::NAME_IDENTIFIER, "alice"),
            Claim::new(claim_types::NAME, "Alice <admin> & \"Bob\""),
        ];
        let xml = build_saml2_assertion("_abc", &descriptor(claims)).unwrap();
        assert!(xml.contains("Alice &lt;admin&gt; &amp; &quot;Bob&quot;"));
        assert!(!xml.contains("<admin>"));
    }

    #[test]
    fn read_back_saml11_authentication_statement() {
        let xml = build_saml11_assertion("_abc", &descriptor(subject_claims())).unwrap();
        let statements = read_authentication_statements(&xml).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].method, authentication_methods::PASSWORD);
    }

    #[test]
    fn read_back_saml2_authentication_statement() {
        let d = descriptor(subject_claims());
        let xml = build_saml2_assertion("_abc", &d).unwrap();
        let statements = read_authentication_statements(&xml).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].method, SAML2_PASSWORD_CONTEXT);
        assert_eq!(
            statements[0].instant,
            d.authentication.unwrap().instant.format(INSTANT_FORMAT).to_string()
        );
    }

    #[test]
    fn split_attribute_types() {
        assert_eq!(
            split_saml11_attribute("http://schemas.example.com/claims/department"),
            ("http://schemas.example.com/claims", "department")
        );
        assert_eq!(split_saml11_attribute("plain"), ("", "plain"));
    }
}
