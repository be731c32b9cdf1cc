//! Metadata endpoint integration tests.

use reqwest::StatusCode;
use reqwest::header;

use wsfed_core::WsFederationOptions;
use wsfed_protocol::endpoints::InMemoryHostProvider;

use crate::common::{TestEnv, provider_for_sign_in, signing_material};

/// The metadata document advertises the role, the key, the token types,
/// and the passive endpoint, signed as the first child.
#[tokio::test]
async fn test_metadata_document_shape() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env.client.get(env.metadata_url()).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("xml"), "expected XML, got {content_type}");

    let body = response.text().await?;
    assert!(body.starts_with("<EntityDescriptor"));
    assert!(body.contains("xsi:type=\"fed:SecurityTokenServiceType\""));
    assert!(body.contains("<Signature"), "metadata is signed by default");
    assert!(body.contains("<KeyDescriptor use=\"signing\">"));
    assert!(body.contains("X509Certificate"));
    assert!(body.contains("<fed:TokenTypesOffered>"));
    assert!(body.contains("Uri=\"urn:oasis:names:tc:SAML:1.0:assertion\""));
    assert!(body.contains("Uri=\"urn:oasis:names:tc:SAML:2.0:assertion\""));
    assert!(body.contains("Uri=\"urn:ietf:params:oauth:token-type:jwt\""));
    assert!(body.contains("<fed:PassiveRequestorEndpoint>"));
    assert!(body.contains(&format!("<Address>{}/wsfederation</Address>", env.base_url)));
    // One line, canonical form.
    assert!(!body.contains('\n'));
    assert!(!body.contains("/>"));

    Ok(())
}

/// Without signing material the document is served unsigned and without
/// a key descriptor.
#[tokio::test]
async fn test_metadata_without_signing_material() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), |base_url| {
        InMemoryHostProvider::new(base_url)
    })
    .await?;

    let response = env.client.get(env.metadata_url()).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(!body.contains("<Signature"));
    assert!(!body.contains("KeyDescriptor"));
    assert!(body.contains("<fed:TokenTypesOffered>"));
    Ok(())
}

/// The configured issuer URI wins over the host base URL and is
/// lowercased by default.
#[tokio::test]
async fn test_metadata_entity_id_uses_issuer_option() -> anyhow::Result<()> {
    let options = WsFederationOptions::default().with_issuer_uri("https://IdP.Example.Com");
    let env = TestEnv::start(options, |base_url| {
        InMemoryHostProvider::new(base_url).with_signing_material(signing_material())
    })
    .await?;

    let response = env.client.get(env.metadata_url()).send().await?;
    let body = response.text().await?;
    assert!(body.contains("entityID=\"https://idp.example.com\""));
    Ok(())
}

/// The metadata endpoint is read-only.
#[tokio::test]
async fn test_metadata_rejects_post() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env.client.post(env.metadata_url()).send().await?;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}
