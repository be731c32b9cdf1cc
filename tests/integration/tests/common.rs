//! Common test utilities and fixtures.

use std::sync::Arc;
use std::time::Duration;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder};
use reqwest::Client;
use reqwest::redirect::Policy;

use wsfed_core::WsFederationOptions;
use wsfed_model::{AuthenticatedSubject, FederationClient, RelyingParty};
use wsfed_protocol::endpoints::in_memory::SESSION_COOKIE;
use wsfed_protocol::endpoints::{InMemoryHostProvider, WsFederationState, wsfederation_router};
use wsfed_protocol::signature::SigningMaterial;
use wsfed_store::InMemoryRelyingPartyStore;

/// Realm used by most tests.
pub const REALM: &str = "urn:rp:example";
/// Registered reply URL for [`REALM`].
pub const REPLY_URL: &str = "https://rp.example.com/callback";
/// Registered post-logout URL for [`REALM`].
pub const POST_LOGOUT_URL: &str = "https://rp.example.com/signed-out";
/// Host session id carried by the test session cookie.
pub const SESSION: &str = "session-1";
/// Subject id behind [`SESSION`].
pub const SUBJECT: &str = "alice";

/// Test environment running the federation router on an ephemeral port.
pub struct TestEnv {
    /// Base URL of the running router.
    pub base_url: String,
    /// HTTP client that never follows redirects.
    pub client: Client,
    /// Shared host provider, for inspecting events and notifications.
    pub provider: Arc<InMemoryHostProvider>,
}

impl TestEnv {
    /// Boots the router with an empty relying-party store.
    ///
    /// The provider builder receives the server's base URL so the
    /// provider can report it as the host base URL.
    pub async fn start(
        options: WsFederationOptions,
        build: impl FnOnce(&str) -> InMemoryHostProvider,
    ) -> anyhow::Result<Self> {
        Self::start_with_relying_parties(options, Vec::new(), build).await
    }

    /// Boots the router with per-relying-party overrides.
    pub async fn start_with_relying_parties(
        options: WsFederationOptions,
        relying_parties: Vec<RelyingParty>,
        build: impl FnOnce(&str) -> InMemoryHostProvider,
    ) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("wsfed_protocol=debug")
            .try_init();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let provider = Arc::new(build(&base_url));
        let store = Arc::new(InMemoryRelyingPartyStore::new(relying_parties)?);
        let state = WsFederationState::new(Arc::clone(&provider), options, store);
        let app = wsfederation_router().with_state(state);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("test server error: {e}");
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            base_url,
            client,
            provider,
        })
    }

    /// URL of the federation endpoint.
    pub fn federation_url(&self) -> String {
        format!("{}/wsfederation", self.base_url)
    }

    /// URL of the metadata endpoint.
    pub fn metadata_url(&self) -> String {
        format!("{}/wsfederation/metadata", self.base_url)
    }

    /// URL of the dedicated sign-out endpoint.
    pub fn signout_url(&self) -> String {
        format!("{}/wsfederation/signout", self.base_url)
    }
}

/// Cookie header value for the given host session.
pub fn session_cookie(session_id: &str) -> String {
    format!("{SESSION_COOKIE}={session_id}")
}

/// An enabled WS-Federation client for [`REALM`] with the standard
/// reply and post-logout registrations.
pub fn test_client() -> FederationClient {
    FederationClient::new(REALM)
        .with_redirect_uri(REPLY_URL)
        .with_post_logout_redirect_uri(POST_LOGOUT_URL)
        .with_scope("openid")
        .with_scope("profile")
}

/// A locally-authenticated password subject for [`SESSION`].
pub fn test_subject() -> AuthenticatedSubject {
    AuthenticatedSubject::new(SUBJECT, SESSION)
}

/// A provider seeded with the standard client, subject, claims, and
/// signing material, ready for token issuance.
pub fn provider_for_sign_in(base_url: &str) -> InMemoryHostProvider {
    InMemoryHostProvider::new(base_url)
        .with_client(test_client())
        .with_subject(SESSION, test_subject())
        .with_claim_types_for_scope("openid", ["sub"])
        .with_claim_types_for_scope("profile", ["name", "email"])
        .with_profile_claims(
            SUBJECT,
            [
                wsfed_model::Claim::new("sub", SUBJECT),
                wsfed_model::Claim::new("name", "Alice Smith"),
                wsfed_model::Claim::new("email", "alice@example.com"),
            ],
        )
        .with_signing_material(signing_material())
}

/// Fresh RSA signing material with a self-signed certificate.
pub fn signing_material() -> SigningMaterial {
    let rsa = Rsa::generate(2048).unwrap();
    let key = PKey::from_rsa(rsa.clone()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "idp.example.com").unwrap();
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

    SigningMaterial {
        private_key_der: rsa.private_key_to_der().unwrap(),
        certificate_der: builder.build().to_der().unwrap(),
    }
}
