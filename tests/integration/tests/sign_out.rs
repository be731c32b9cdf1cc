//! Sign-out flow integration tests.

use reqwest::StatusCode;
use reqwest::header;

use wsfed_core::{FederationEventType, WsFederationOptions};
use wsfed_protocol::endpoints::InMemoryHostProvider;

use crate::common::{
    POST_LOGOUT_URL, REALM, SESSION, SUBJECT, TestEnv, provider_for_sign_in, session_cookie,
    test_client, test_subject,
};

fn provider_for_sign_out(base_url: &str) -> InMemoryHostProvider {
    provider_for_sign_in(base_url).with_signout_clients(SESSION, [REALM, "urn:rp:other"])
}

/// A full sign-out stores a logout notification and redirects to the
/// host logout page carrying its identifier.
#[tokio::test]
async fn test_sign_out_redirects_to_logout_with_notification_id() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_out).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[
            ("wa", "wsignout1.0"),
            ("wtrealm", REALM),
            ("wreply", POST_LOGOUT_URL),
            ("wctx", "bye"),
        ])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(
        location.starts_with("/account/logout?logoutId="),
        "unexpected location {location}"
    );

    let notifications = env.provider.logout_notifications().await;
    assert_eq!(notifications.len(), 1);
    let notification = &notifications[0];
    assert_eq!(notification.session_id.as_deref(), Some(SESSION));
    assert_eq!(notification.subject_id.as_deref(), Some(SUBJECT));
    assert_eq!(notification.client_ids, vec![REALM, "urn:rp:other"]);
    assert_eq!(notification.post_logout_redirect_uri.as_deref(), Some(POST_LOGOUT_URL));
    assert_eq!(notification.context.as_deref(), Some("bye"));

    let events = env.provider.events().await;
    assert!(
        events
            .iter()
            .any(|e| e.event_type == FederationEventType::SignOutSuccess
                && e.realm.as_deref() == Some(REALM)
                && e.session_id.as_deref() == Some(SESSION)),
        "sign-out should be audited"
    );

    Ok(())
}

/// The dedicated sign-out endpoint treats a missing wa as wsignout1.0.
#[tokio::test]
async fn test_signout_endpoint_defaults_missing_wa() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.signout_url())
        .query(&[("wtrealm", REALM)])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    // Nothing to notify and nowhere to return to, so no logout id.
    assert_eq!(location, "/account/logout");
    Ok(())
}

/// Sign-out without a session still lands on the host logout page.
#[tokio::test]
async fn test_sign_out_without_session_redirects_plainly() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_out).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignout1.0"), ("wtrealm", REALM)])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert_eq!(location, "/account/logout");

    let notifications = env.provider.logout_notifications().await;
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].client_ids.is_empty());
    assert!(notifications[0].session_id.is_none());
    Ok(())
}

/// An unregistered wreply is dropped rather than failing the sign-out.
#[tokio::test]
async fn test_sign_out_drops_unregistered_wreply() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_out).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[
            ("wa", "wsignout1.0"),
            ("wtrealm", REALM),
            ("wreply", "https://evil.example.com/phish"),
        ])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(location.starts_with("/account/logout?logoutId="));

    let notifications = env.provider.logout_notifications().await;
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].post_logout_redirect_uri.is_none());
    assert_eq!(notifications[0].client_ids, vec![REALM, "urn:rp:other"]);
    Ok(())
}

/// `wsignoutcleanup1.0` takes the same path as a full sign-out.
#[tokio::test]
async fn test_sign_out_cleanup_action_on_federation_endpoint() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_out).await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignoutcleanup1.0"), ("wtrealm", REALM)])
        .header(header::COOKIE, session_cookie(SESSION))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(location.starts_with("/account/logout"));
    Ok(())
}

/// The sign-out endpoint refuses explicit sign-in messages.
#[tokio::test]
async fn test_signout_endpoint_rejects_sign_in_messages() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), provider_for_sign_in).await?;

    let response = env
        .client
        .get(env.signout_url())
        .query(&[("wa", "wsignin1.0"), ("wtrealm", REALM)])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

/// Unknown realms are rejected and audited on sign-out too.
#[tokio::test]
async fn test_sign_out_unknown_realm_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::start(WsFederationOptions::default(), |base_url| {
        InMemoryHostProvider::new(base_url)
            .with_client(test_client())
            .with_subject(SESSION, test_subject())
    })
    .await?;

    let response = env
        .client
        .get(env.federation_url())
        .query(&[("wa", "wsignout1.0"), ("wtrealm", "urn:unknown:rp")])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await?;
    assert!(body.contains("invalid_relying_party"));

    let events = env.provider.events().await;
    assert!(
        events
            .iter()
            .any(|e| e.event_type == FederationEventType::SignOutFailure),
        "rejection should be audited"
    );
    Ok(())
}
