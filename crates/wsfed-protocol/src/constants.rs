//! WS-Federation protocol constants.

/// Protocol actions carried in the `wa` parameter.
pub mod actions {
    /// Passive sign-in request.
    pub const SIGN_IN: &str = "wsignin1.0";
    /// Passive sign-out request.
    pub const SIGN_OUT: &str = "wsignout1.0";
    /// Sign-out cleanup notification from another session participant.
    pub const SIGN_OUT_CLEANUP: &str = "wsignoutcleanup1.0";
}

/// XML namespaces used in envelopes, assertions, and metadata.
pub mod namespaces {
    /// WS-Trust February 2005, `t` prefix.
    pub const WS_TRUST_2005: &str = "http://schemas.xmlsoap.org/ws/2005/02/trust";
    /// WS-Trust 1.3, `trust` prefix.
    pub const WS_TRUST_13: &str = "http://docs.oasis-open.org/ws-sx/ws-trust/200512";
    /// WS-Policy, for `AppliesTo`.
    pub const WS_POLICY: &str = "http://schemas.xmlsoap.org/ws/2004/09/policy";
    /// WS-Addressing, for endpoint references.
    pub const WS_ADDRESSING: &str = "http://www.w3.org/2005/08/addressing";
    /// WSS utility schema, for `Created` / `Expires`.
    pub const WS_UTILITY: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
    /// WSS security extensions, for `BinarySecurityToken`.
    pub const WS_SECURITY: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
    /// WS-Federation metadata extensions.
    pub const WS_FEDERATION: &str = "http://docs.oasis-open.org/wsfed/federation/200706";
    /// WS-Addressing 2004/08, used inside federation metadata endpoints.
    pub const WS_ADDRESSING_200408: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
    /// SAML 1.1 assertions.
    pub const SAML11_ASSERTION: &str = "urn:oasis:names:tc:SAML:1.0:assertion";
    /// SAML 2.0 assertions.
    pub const SAML2_ASSERTION: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
    /// SAML 2.0 metadata.
    pub const SAML2_METADATA: &str = "urn:oasis:names:tc:SAML:2.0:metadata";
    /// XML digital signatures.
    pub const XML_DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";
    /// XML encryption.
    pub const XML_ENC: &str = "http://www.w3.org/2001/04/xmlenc#";
    /// XML Schema instance attributes.
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
}

/// XML-DSig canonicalization and transform URIs.
pub mod transforms {
    /// Exclusive canonicalization.
    pub const EXCLUSIVE_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
    /// Enveloped signature transform.
    pub const ENVELOPED_SIGNATURE: &str =
        "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
}

/// SAML authentication-method URIs for authentication statements.
pub mod authentication_methods {
    /// Password authentication.
    pub const PASSWORD: &str = "urn:oasis:names:tc:SAML:1.0:am:password";
    /// Unspecified method.
    pub const UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.0:am:unspecified";
}

/// Authentication-method references as the host session records them.
pub mod amr {
    /// Password login.
    pub const PASSWORD: &str = "pwd";
    /// External identity provider.
    pub const EXTERNAL: &str = "external";
}

/// Identity-provider names with special meaning.
pub mod identity_providers {
    /// The host's own login page.
    pub const LOCAL: &str = "local";
}

/// WSS encoding type for base64 binary security tokens.
pub const BASE64_BINARY_ENCODING: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// Maximum `wreqptr` length tolerated; a URL pointer longer than this is
/// malformed per the passive profile.
pub const MAX_WREQPTR_LENGTH: usize = 512;

/// Timestamp format for assertion instants: milliseconds, UTC.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_values_match_the_passive_profile() {
        assert_eq!(actions::SIGN_IN, "wsignin1.0");
        assert_eq!(actions::SIGN_OUT, "wsignout1.0");
        assert_eq!(actions::SIGN_OUT_CLEANUP, "wsignoutcleanup1.0");
    }

    #[test]
    fn trust_namespaces_are_distinct_generations() {
        assert!(namespaces::WS_TRUST_2005.contains("2005"));
        assert!(namespaces::WS_TRUST_13.contains("200512"));
        assert_ne!(namespaces::WS_TRUST_2005, namespaces::WS_TRUST_13);
    }
}
