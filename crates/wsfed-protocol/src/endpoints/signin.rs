//! Sign-in endpoint handlers.
//!
//! The federation endpoint accepts passive-profile messages by GET query
//! string or POSTed form and dispatches on `wa`. Sign-in runs
//! validation, the interaction checks, and response generation, then
//! returns the result envelope to the relying party's reply URL with an
//! auto-submitting POST form. When the host must authenticate the user
//! first, the handler redirects to the host login page with a return URL
//! pointing back at the callback endpoint.

use axum::Form;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use tracing::{debug, error, info, warn};

use wsfed_core::{CspLevel, CspOptions, FederationEvent, FederationEventType, WsFederationOptions};

use crate::constants::actions;
use crate::error::{WsFederationError, WsFederationResult};
use crate::interaction::InteractionResponse;
use crate::message::WsFederationMessage;
use crate::validation::{ValidatedWsFederationRequest, ValidationResult, error_codes};

use super::router::paths;
use super::signout::process_sign_out;
use super::state::{FederationHostProvider, WsFederationState};

/// Script that submits the response form once the page has loaded.
///
/// The CSP header whitelists this exact text by hash, so any edit here
/// must be mirrored in [`AUTO_POST_SCRIPT_HASH`].
pub const AUTO_POST_SCRIPT: &str =
    "window.addEventListener('load', function(){document.forms[0].submit();});";

/// CSP source expression for [`AUTO_POST_SCRIPT`].
pub const AUTO_POST_SCRIPT_HASH: &str = "'sha256-orD0/VhH8hLqrLxKHD/HUEMdwqX6/0ve7c5hspX5VJ8='";

/// Protocol responses carry tokens and must never be cached.
const CACHE_CONTROL_NO_STORE: &str = "no-store, max-age=0";

const DEPRECATED_CSP_HEADER: &str = "x-content-security-policy";

/// GET handler for the federation endpoint.
pub async fn federation_get<P: FederationHostProvider>(
    State(state): State<WsFederationState<P>>,
    Query(message): Query<WsFederationMessage>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, message, &headers).await
}

/// POST handler for the federation endpoint.
///
/// The form extractor rejects non-form bodies with 415 before the
/// handler runs.
pub async fn federation_post<P: FederationHostProvider>(
    State(state): State<WsFederationState<P>>,
    headers: HeaderMap,
    Form(message): Form<WsFederationMessage>,
) -> Response {
    dispatch(&state, message, &headers).await
}

/// GET handler for the post-login callback.
///
/// The login redirect only ever encodes sign-in messages into the
/// return URL, so anything else here is a forged or corrupted request.
pub async fn signin_callback<P: FederationHostProvider>(
    State(state): State<WsFederationState<P>>,
    Query(message): Query<WsFederationMessage>,
    headers: HeaderMap,
) -> Response {
    if message.is_sign_in() {
        process_sign_in(&state, message, &headers).await
    } else {
        warn!(wa = message.wa.as_deref(), "callback without a sign-in message");
        error_page(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_REQUEST,
            "the callback only resumes sign-in requests",
        )
    }
}

async fn dispatch<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    message: WsFederationMessage,
    headers: &HeaderMap,
) -> Response {
    match message.wa.as_deref() {
        Some(actions::SIGN_IN) => process_sign_in(state, message, headers).await,
        Some(actions::SIGN_OUT | actions::SIGN_OUT_CLEANUP) => {
            process_sign_out(state, message, headers).await
        }
        other => {
            warn!(wa = other, "unsupported wa value");
            error_page(
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_REQUEST,
                "the wa parameter is missing or not supported",
            )
        }
    }
}

async fn process_sign_in<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    message: WsFederationMessage,
    headers: &HeaderMap,
) -> Response {
    match sign_in_flow(state, &message, headers).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "sign-in request failed");
            raise_sign_in_failure(state, &message, err.error_code()).await;
            let status = StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_page(status, err.error_code(), "the sign-in request could not be served")
        }
    }
}

async fn sign_in_flow<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    message: &WsFederationMessage,
    headers: &HeaderMap,
) -> WsFederationResult<Response> {
    let subject = state.provider().current_subject(headers).await?;

    let validated = match state
        .validator()
        .validate_sign_in_request(message, subject.as_ref())
        .await?
    {
        ValidationResult::Success(validated) => validated,
        ValidationResult::Failure { error, error_description } => {
            warn!(error, error_description, "sign-in validation rejected the request");
            raise_sign_in_failure(state, message, &error).await;
            return Ok(error_page(StatusCode::BAD_REQUEST, &error, &error_description));
        }
    };

    match state.interaction_generator().process(&validated).await? {
        InteractionResponse::Proceed => {}
        InteractionResponse::Login => return login_redirect(state, &validated).await,
        InteractionResponse::Redirect(url) => return Ok(found_redirect(&url)),
        InteractionResponse::Error { error, error_description } => {
            warn!(error, error_description, "interaction checks rejected the request");
            raise_sign_in_failure(state, message, &error).await;
            return Ok(error_page(StatusCode::BAD_REQUEST, &error, &error_description));
        }
    }

    let response_message = state.response_generator().generate_response(&validated).await?;
    let reply_url = validated.reply_url.as_deref().ok_or_else(|| {
        WsFederationError::Internal("validated sign-in request without a reply URL".to_string())
    })?;

    let mut event = FederationEvent::builder(FederationEventType::SignInSuccess)
        .realm(&validated.client.client_id)
        .details(message.redacted_details());
    if let Some(subject) = validated.subject.as_ref() {
        event = event.subject(&subject.subject_id);
    }
    if let Some(session_id) = validated.session_id.as_deref() {
        event = event.session(session_id);
    }
    state.provider().raise_event(event.build()).await?;

    info!(
        realm = %validated.client.client_id,
        reply_url,
        "returning sign-in response to relying party"
    );
    Ok(auto_post_form(state.options(), reply_url, &response_message))
}

/// Builds the redirect to the host login page.
///
/// The return URL replays the message through the callback endpoint,
/// minus the parameters [`WsFederationMessage::callback_message`] drops.
async fn login_redirect<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    validated: &ValidatedWsFederationRequest,
) -> WsFederationResult<Response> {
    let base_url = state.provider().base_url().await?;
    let return_url = format!(
        "{}{}?{}",
        base_url.trim_end_matches('/'),
        paths::CALLBACK,
        validated.message.callback_message().to_query_string()
    );

    let options = state.options();
    let separator = if options.login_url.contains('?') { '&' } else { '?' };
    let target = format!(
        "{}{}{}={}",
        options.login_url,
        separator,
        options.return_url_parameter,
        urlencoding::encode(&return_url)
    );

    debug!(realm = %validated.client.client_id, "redirecting to host login");
    Ok(found_redirect(&target))
}

async fn raise_sign_in_failure<P: FederationHostProvider>(
    state: &WsFederationState<P>,
    message: &WsFederationMessage,
    error: &str,
) {
    let mut event = FederationEvent::builder(FederationEventType::SignInFailure)
        .failure(error)
        .details(message.redacted_details());
    if let Some(realm) = message.wtrealm.as_deref() {
        event = event.realm(realm);
    }
    if let Err(err) = state.provider().raise_event(event.build()).await {
        warn!(error = %err, "failed to record sign-in failure event");
    }
}

/// Renders the auto-submitting POST form that carries the response
/// message back to the relying party.
fn auto_post_form(
    options: &WsFederationOptions,
    action: &str,
    message: &WsFederationMessage,
) -> Response {
    let mut fields = String::new();
    for (name, value) in [
        ("wa", message.wa.as_deref()),
        ("wresult", message.wresult.as_deref()),
        ("wctx", message.wctx.as_deref()),
    ] {
        if let Some(value) = value {
            fields.push_str(&format!(
                "<input type=\"hidden\" name=\"{name}\" value=\"{}\" />",
                html_escape(value)
            ));
        }
    }

    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\" /><title>Working...</title></head>\
         <body><form method=\"post\" action=\"{}\">{fields}\
         <noscript><button type=\"submit\">Continue</button></noscript></form>\
         <script>{AUTO_POST_SCRIPT}</script></body></html>",
        html_escape(action)
    );

    let mut response = Html(html).into_response();
    apply_html_headers(response.headers_mut());
    apply_csp_headers(response.headers_mut(), options.csp);
    response
}

/// Renders a protocol error as a neutral HTML page.
///
/// Error pages stay on the identity provider; nothing is returned to an
/// unvalidated wire address, and the body never leaks host internals.
pub(super) fn error_page(status: StatusCode, error: &str, error_description: &str) -> Response {
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\" /><title>Error</title></head>\
         <body><h1>{}</h1><p>{}</p></body></html>",
        html_escape(error),
        html_escape(error_description)
    );

    let mut response = (status, Html(html)).into_response();
    apply_html_headers(response.headers_mut());
    response
}

/// Issues a plain 302 redirect.
pub(super) fn found_redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = StatusCode::FOUND.into_response();
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => {
            error!(location, "redirect target is not a valid header value");
            error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "the redirect target could not be encoded",
            )
        }
    }
}

fn apply_html_headers(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_NO_STORE));
}

fn apply_csp_headers(headers: &mut HeaderMap, csp: CspOptions) {
    if let Ok(value) = HeaderValue::from_str(&csp_header_value(csp)) {
        headers.insert(header::CONTENT_SECURITY_POLICY, value.clone());
        if csp.add_deprecated_header {
            headers.insert(DEPRECATED_CSP_HEADER, value);
        }
    }
}

/// Builds the CSP value for the auto-post page.
///
/// Level 1 keeps `'unsafe-inline'` so browsers that predate hash
/// sources still run the submit script; level 2 browsers ignore it in
/// the presence of the hash.
fn csp_header_value(csp: CspOptions) -> String {
    match csp.level {
        CspLevel::One => {
            format!("default-src 'none'; script-src 'unsafe-inline' {AUTO_POST_SCRIPT_HASH}")
        }
        CspLevel::Two => format!("default-src 'none'; script-src {AUTO_POST_SCRIPT_HASH}"),
    }
}

fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
