//! Sign-in flow integration tests.

use reqwest::StatusCode;
use reqwest::header;

use wsfed_core::{EventOutcome, FederationEventType, WsFederationOptions};
use wsfed_model::{RelyingParty, TokenType, WsTrustVersion};
use wsfed_protocol::endpoints::InMemoryHostProvider;

use crate::common::{REALM, REPLY_URL, SESSION, SUBJECT, TestEnv, provider_for_sign_in, session_cookie};

/// An authenticated session turns a sign-in request into an
/// auto-submitting POST form aimed at the registered reply URL.
#[tokio::test]
async fn test_sign_in_with_session_returns_auto_post_form() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignin1.0"), ("wtrealm", REALM), ("wctx", "abc123")])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/html"), "expected HTML, got {content_type}");

    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert_eq!(cache_control, "no-store, max-age=0");

    let csp = response
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(csp.contains("script-src 'sha256-"), "expected hash source, got {csp}");
    assert!(
        response.headers().contains_key("x-content-security-policy"),
        "deprecated CSP header should be mirrored by default"
    );

    let body = response.text().await?;
    assert!(body.contains(&format!("action=\"{REPLY_URL}\"")));
    assert!(body.contains("name=\"wa\" value=\"wsignin1.0\""));
    assert!(body.contains("name=\"wctx\" value=\"abc123\""));
    // Default envelope is WS-Trust 1.3: a response collection under the
    // trust prefix, HTML-escaped inside the hidden field.
    assert!(body.contains("trust:RequestSecurityTokenResponseCollection"));
    assert!(body.contains("saml:Assertion"), "default token type is SAML 1.1");
    assert!(body.contains("<noscript>"));

    let events = env.provider.events().await;
    assert!(
        events
            .iter()
            .any(|e| e.event_type == FederationEventType::TokenIssued
                && e.subject_id.as_deref() == Some(SUBJECT)),
        "token issuance should be audited"
    );
    assert!(
        events
            .iter()
            .any(|e| e.event_type == FederationEventType::SignInSuccess
                && e.realm.as_deref() == Some(REALM)),
        "sign-in success should be audited"
    );

    Ok(())
}

/// Without a session the browser is sent to the host login page with a
/// return URL that replays the request through the callback endpoint.
#[tokio::test]
async fn test_sign_in_without_session_redirects_to_login() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    // The wct must be within the configured tolerance of the server
    // clock at run time for the request to survive validation.
    let wct = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let response = env
        .client
        .get(env.federation_url())
        .query(&[
            ("wa", "wsignin1.0"),
            ("wtrealm", REALM),
            ("wctx", "abc123"),
            ("wfresh", "0"),
            ("wct", wct.as_str()),
        ])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(
        location.starts_with("/account/login?returnUrl="),
        "unexpected location {location}"
    );

    let encoded = location.trim_start_matches("/account/login?returnUrl=");
    let return_url = urlencoding::decode(encoded)?;
    assert!(return_url.starts_with(&format!("{}/wsfederation/callback?", env.base_url)));
    assert!(return_url.contains("wa=wsignin1.0"));
    assert!(return_url.contains("wtrealm=urn%3Arp%3Aexample"));
    assert!(return_url.contains("wctx=abc123"));
    // The replay must not loop on freshness or fail on a stale timestamp.
    assert!(!return_url.contains("wfresh="));
    assert!(!return_url.contains("wct="));

    Ok(())
}

/// Following the login redirect's return URL with a fresh session
/// completes the original sign-in.
#[tokio::test]
async fn test_sign_in_callback_completes_after_login() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignin1.0"), ("wtrealm", REALM), ("wctx", "ctx-42")])
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let encoded = location.trim_start_matches("/account/login?returnUrl=");
    let return_url = urlencoding::decode(encoded)?.into_owned();

    // The host login page authenticates the user and sends the browser
    // back to the return URL; the session cookie stands in for that.
    let callback = env
        .client
        .get(&return_url)
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(callback.status(), StatusCode::OK);
    let body = callback.text().await?;
    assert!(body.contains(&format!("action=\"{REPLY_URL}\"")));
    assert!(body.contains("name=\"wctx\" value=\"ctx-42\""));

    Ok(())
}

/// The callback endpoint only resumes sign-in messages.
#[tokio::test]
async fn test_callback_rejects_non_sign_in_messages() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(format!("{}/wsfederation/callback", env.base_url))
        .query(&[("wa", "wsignout1.0"), ("wtrealm", REALM)])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

/// An unknown realm is rejected on the IdP's own error page and audited
/// as a failure; nothing is sent to the wire address.
#[tokio::test]
async fn test_sign_in_unknown_realm_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignin1.0"), ("wtrealm", "urn:unknown:rp")])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await?;
    assert!(body.contains("invalid_relying_party"));

    let events = env.provider.events().await;
    assert!(
        events
            .iter()
            .any(|e| e.event_type == FederationEventType::SignInFailure
                && e.outcome == EventOutcome::Failure
                && e.error.as_deref() == Some("invalid_relying_party")),
        "rejection should be audited"
    );

    Ok(())
}

/// A missing wtrealm fails before any client lookup.
#[tokio::test]
async fn test_sign_in_requires_wtrealm() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignin1.0")])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await?;
    assert!(body.contains("invalid_request"));
    Ok(())
}

/// The federation endpoint accepts the same message as a POSTed form.
#[tokio::test]
async fn test_sign_in_post_binding() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .post(env.federation_url())
        .form(&[("wa", "wsignin1.0"), ("wtrealm", REALM)])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(body.contains(&format!("action=\"{REPLY_URL}\"")));
    Ok(())
}

/// Non-form POST bodies are rejected with 415 before the handler runs.
#[tokio::test]
async fn test_post_with_wrong_content_type_is_unsupported() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .post(env.federation_url())
        .header(header::CONTENT_TYPE, "application/json")
        .body("{\"wa\":\"wsignin1.0\"}")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    Ok(())
}

/// Methods outside the endpoint table are refused.
#[tokio::test]
async fn test_federation_endpoint_rejects_other_methods() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env.client.put(env.federation_url()).send().await?;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

/// An unsupported wa value is a protocol error, not a 404.
#[tokio::test]
async fn test_unsupported_wa_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wattr1.0"), ("wtrealm", REALM)])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await?;
    assert!(body.contains("invalid_request"));
    Ok(())
}

/// `wfresh=0` forces a login round trip even with a live session.
#[tokio::test]
async fn test_wfresh_zero_forces_login_despite_session() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignin1.0"), ("wtrealm", REALM), ("wfresh", "0")])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(location.starts_with("/account/login?"), "unexpected location {location}");
    assert!(!location.contains("wfresh"), "the replay must drop wfresh=0");
    Ok(())
}

/// A `wct` outside the configured tolerance fails validation.
#[tokio::test]
async fn test_stale_wct_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[
            ("wa", "wsignin1.0"),
            ("wtrealm", REALM),
            ("wct", "2001-01-01T00:00:00Z"),
        ])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await?;
    assert!(body.contains("invalid_request"));
    Ok(())
}

/// Per-relying-party overrides switch both the token type and the
/// WS-Trust envelope generation.
#[tokio::test]
async fn test_relying_party_overrides_token_type_and_envelope() -> anyhow::Result<()> {
    let relying_party = RelyingParty::new(REALM)
        .with_token_type(TokenType::Jwt)
        .with_ws_trust_version(WsTrustVersion::WsTrust2005);

    let env = TestEnv::start_with_relying_parties(
        WsFederationOptions::default(),
        vec![relying_party],
        provider_for_sign_in,
    )
    .await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignin1.0"), ("wtrealm", REALM)])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    // 2005 envelope: bare response element under the t prefix.
    assert!(body.contains("t:RequestSecurityTokenResponse"));
    assert!(!body.contains("RequestSecurityTokenResponseCollection"));
    // JWTs travel as a base64 binary security token, not an assertion.
    assert!(body.contains("BinarySecurityToken"));
    assert!(!body.contains("saml:Assertion"));
    Ok(())
}

/// Token issuance needs signing material; without it the request fails
/// as a server error, not a protocol error.
#[tokio::test]
async fn test_sign_in_without_signing_material_is_a_server_error() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), |base_url| {
        InMemoryHostProvider::new(base_url)
            .with_client(crate::common::test_client())
            .with_subject(SESSION, crate::common::test_subject())
    })
    .await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignin1.0"), ("wtrealm", REALM)])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await?;
    assert!(body.contains("server_error"));
    assert!(!body.contains("signing"), "error page must not leak internals");

    let events = env.provider.events().await;
    assert!(
        events
            .iter()
            .any(|e| e.event_type == FederationEventType::SignInFailure),
        "the failure should be audited"
    );
    Ok(())
}
