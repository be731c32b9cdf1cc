//! Sign-out endpoint handlers.
//!
//! Sign-out never ends the host session directly. The handler validates
//! the request, hands the host a [`LogoutNotification`] describing what
//! to clean up, and redirects the browser to the host logout page. The
//! notification carries the clients to notify with `wsignoutcleanup1.0`
//! and the validated post-logout return target; the host renders those
//! from its logout page once the session is actually gone.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use tracing::{error, info, warn};

use wsfed_core::{FederationEvent, FederationEventType};

use crate::constants::actions;
use crate::error::WsFederationResult;
use crate::message::WsFederationMessage;
use crate::validation::{ValidationResult, error_codes};

use super::signin::{error_page, found_redirect};
use super::state::{FederationHostProvider, LogoutNotification, WsFederationState};

/// GET handler for the dedicated sign-out endpoint.
///
/// Relying parties commonly register this path as a plain logout URL
/// and hit it without any parameters, so a missing `wa` is read as
/// `wsignout1.0`.
pub async fn signout_cleanup<P: FederationHostProvider>(
    State(state): State<WsFederationState<P>>,
    Query(mut message): Query<WsFederationMessage>,
    headers: HeaderMap,
) -> Response {
    if message.wa.is_none() {
        message.wa = Some(actions::SIGN_OUT.to_string());
    }

    if message.is_sign_out() {
        process_sign_out(&state, message, &headers).await
    } else {
        warn!(wa = message.wa.as_deref(), "sign-out endpoint received a non-sign-out message");
        error_page(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_REQUEST,
            "the sign-out endpoint only accepts sign-out messages",
        )
    }
}

/// Runs the sign-out flow for an already-dispatched message.
pub(super) async fn process_sign_out<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    message: WsFederationMessage,
    headers: &HeaderMap,
) -> Response {
    match sign_out_flow(state, &message, headers).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "sign-out request failed");
            raise_sign_out_failure(state, &message, err.error_code()).await;
            let status = StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_page(status, err.error_code(), "the sign-out request could not be served")
        }
    }
}

async fn sign_out_flow<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    message: &WsFederationMessage,
    headers: &HeaderMap,
) -> WsFederationResult<Response> {
    let subject = state.provider().current_subject(headers).await?;

    let validated = match state
        .validator()
        .validate_sign_out_request(message, subject.as_ref())
        .await?
    {
        ValidationResult::Success(validated) => validated,
        ValidationResult::Failure { error, error_description } => {
            warn!(error, error_description, "sign-out validation rejected the request");
            raise_sign_out_failure(state, message, &error).await;
            return Ok(error_page(StatusCode::BAD_REQUEST, &error, &error_description));
        }
    };

    let notification = LogoutNotification {
        session_id: validated.session_id.clone(),
        subject_id: validated.subject.as_ref().map(|s| s.subject_id.clone()),
        client_ids: validated.signout_client_ids.clone(),
        post_logout_redirect_uri: validated.reply_url.clone(),
        context: validated.message.wctx.clone(),
    };
    let logout_id = state.provider().store_logout_notification(&notification).await?;

    let mut event = FederationEvent::builder(FederationEventType::SignOutSuccess)
        .realm(&validated.client.client_id)
        .details(message.redacted_details());
    if let Some(subject) = validated.subject.as_ref() {
        event = event.subject(&subject.subject_id);
    }
    if let Some(session_id) = validated.session_id.as_deref() {
        event = event.session(session_id);
    }
    state.provider().raise_event(event.build()).await?;

    let options = state.options();
    let target = match logout_id.as_deref() {
        Some(id) => {
            let separator = if options.logout_url.contains('?') { '&' } else { '?' };
            format!(
                "{}{}{}={}",
                options.logout_url,
                separator,
                options.logout_id_parameter,
                urlencoding::encode(id)
            )
        }
        None => options.logout_url.clone(),
    };

    info!(realm = %validated.client.client_id, "redirecting to host logout");
    Ok(found_redirect(&target))
}

async fn raise_sign_out_failure<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    message: &WsFederationMessage,
    error: &str,
) {
    let mut event = FederationEvent::builder(FederationEventType::SignOutFailure)
        .failure(error)
        .details(message.redacted_details());
    if let Some(realm) = message.wtrealm.as_deref() {
        event = event.realm(realm);
    }
    if let Err(err) = state.provider().raise_event(event.build()).await {
        warn!(error = %err, "failed to record sign-out failure event");
    }
}
