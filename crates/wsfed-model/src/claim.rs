//! Claims and the claim-type vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// WS-* identity claim-type URIs.
///
/// These are the types relying parties built on WIF expect; the default
/// claim mapping translates the host's short claim names into them.
pub mod claim_types {
    /// Subject name identifier.
    pub const NAME_IDENTIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
    /// Display name.
    pub const NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
    /// Given name.
    pub const GIVEN_NAME: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname";
    /// Surname.
    pub const SURNAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname";
    /// Email address.
    pub const EMAIL_ADDRESS: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
    /// Date of birth.
    pub const DATE_OF_BIRTH: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/dateofbirth";
    /// Web page.
    pub const WEBPAGE: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/webpage";
    /// Gender.
    pub const GENDER: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/gender";
    /// Role membership. Lives in the 2008/06 namespace; the 2005/05
    /// vocabulary never defined one.
    pub const ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
    /// How the subject authenticated.
    pub const AUTHENTICATION_METHOD: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/authenticationmethod";
    /// When the subject authenticated.
    pub const AUTHENTICATION_INSTANT: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/authenticationinstant";
}

/// Property URIs attached to claims for token handlers.
pub mod claim_properties {
    /// SAML NameID format carried on the name-identifier claim.
    pub const FORMAT: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/format";
    /// The pre-mapping claim type, preserved across claim-type mapping.
    pub const SHORT_TYPE_NAME: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/ShortTypeName";
}

/// SAML NameID format URIs.
pub mod name_id_formats {
    /// Unspecified format, the profile default.
    pub const UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";
    /// Email address format.
    pub const EMAIL_ADDRESS: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";
    /// Persistent identifier (SAML 2.0).
    pub const PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";
    /// Transient identifier (SAML 2.0).
    pub const TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";
}

/// A single statement about a subject.
///
/// Claims flow from the host's profile service through claim-type mapping
/// into token issuance. The `properties` map carries annotations read by
/// token handlers, keyed by the URIs in [`claim_properties`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim type, a URI after mapping.
    #[serde(rename = "type")]
    pub claim_type: String,

    /// Claim value.
    pub value: String,

    /// Optional XML Schema value type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    /// Handler-facing properties.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

impl Claim {
    /// Creates a claim with the given type and value.
    #[must_use]
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type: None,
            properties: HashMap::new(),
        }
    }

    /// Attaches a property, builder style.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns a property value by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
