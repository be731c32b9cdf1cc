//! Security-token and WS-Trust envelope selectors.

use serde::{Deserialize, Serialize};

/// The kind of security token issued to a relying party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenType {
    /// SAML 1.1 assertion, the historical WS-Federation default.
    #[default]
    Saml11,
    /// SAML 2.0 assertion.
    Saml2,
    /// JSON Web Token, carried as a binary security token.
    Jwt,
}

impl TokenType {
    /// Returns the token-type URI used in `TokenType` elements.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Saml11 => "urn:oasis:names:tc:SAML:1.0:assertion",
            Self::Saml2 => "urn:oasis:names:tc:SAML:2.0:assertion",
            Self::Jwt => "urn:ietf:params:oauth:token-type:jwt",
        }
    }

    /// Parses a token-type URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            "urn:oasis:names:tc:SAML:1.0:assertion" => Some(Self::Saml11),
            "urn:oasis:names:tc:SAML:2.0:assertion" => Some(Self::Saml2),
            "urn:ietf:params:oauth:token-type:jwt" => Some(Self::Jwt),
            _ => None,
        }
    }

    /// True for either SAML assertion flavor.
    #[must_use]
    pub const fn is_saml(self) -> bool {
        matches!(self, Self::Saml11 | Self::Saml2)
    }
}

/// WS-Trust generation used for the response envelope.
///
/// The 2005 drafts put the response element directly in `wresult` under the
/// `t` prefix; WS-Trust 1.3 wraps it in a response collection under the
/// `trust` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WsTrustVersion {
    /// Defer to the configured plugin default.
    #[default]
    Default,
    /// WS-Trust February 2005.
    WsTrust2005,
    /// WS-Trust 1.3.
    WsTrust13,
}

impl WsTrustVersion {
    /// Resolves `Default` against the plugin-wide setting.
    #[must_use]
    pub fn resolve(self, fallback: Self) -> Self {
        match self {
            Self::Default => match fallback {
                // A misconfigured fallback of `Default` degrades to 1.3.
                Self::Default => Self::WsTrust13,
                other => other,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_type_uri_round_trip() {
        for token_type in [TokenType::Saml11, TokenType::Saml2, TokenType::Jwt] {
            assert_eq!(TokenType::from_uri(token_type.uri()), Some(token_type));
        }
        assert_eq!(TokenType::from_uri("urn:unknown"), None);
    }

    #[test]
    fn saml_flavors() {
        assert!(TokenType::Saml11.is_saml());
        assert!(TokenType::Saml2.is_saml());
        assert!(!TokenType::Jwt.is_saml());
    }

    #[test]
    fn trust_version_resolution() {
        assert_eq!(
            WsTrustVersion::Default.resolve(WsTrustVersion::WsTrust2005),
            WsTrustVersion::WsTrust2005
        );
        assert_eq!(
            WsTrustVersion::WsTrust13.resolve(WsTrustVersion::WsTrust2005),
            WsTrustVersion::WsTrust13
        );
        assert_eq!(
            WsTrustVersion::Default.resolve(WsTrustVersion::Default),
            WsTrustVersion::WsTrust13
        );
    }

    #[test]
    fn serde_uses_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TokenType::Saml11).unwrap(),
            "\"saml11\""
        );
        assert_eq!(
            serde_json::to_string(&WsTrustVersion::WsTrust13).unwrap(),
            "\"ws-trust13\""
        );
    }
}
