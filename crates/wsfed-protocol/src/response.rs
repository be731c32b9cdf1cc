//! Sign-in response generation.
//!
//! Turns a validated sign-in request plus an acceptable session into the
//! outgoing message: claims are fetched and mapped, the three mandatory
//! claims are guaranteed, a token is minted and signed, and the result is
//! wrapped in a WS-Trust response envelope bound for the reply URL.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use tracing::debug;

use wsfed_core::{FederationEvent, FederationEventType, WsFederationOptions};
use wsfed_model::claim::{claim_properties, claim_types};
use wsfed_model::{AuthenticatedSubject, Claim, WsTrustVersion};

use crate::claims::{ClaimsService, map_claims};
use crate::constants::{INSTANT_FORMAT, actions, amr, authentication_methods};
use crate::endpoints::state::FederationHostProvider;
use crate::error::{WsFederationError, WsFederationResult};
use crate::message::WsFederationMessage;
use crate::token::{
    AuthenticationInformation, EncryptionParameters, RequestSecurityTokenResponse,
    SecurityTokenDescriptor, TokenHandlerRegistry,
};
use crate::validation::ValidatedWsFederationRequest;

/// Builds the sign-in response message for a validated request.
pub struct SignInResponseGenerator<P> {
    provider: Arc<P>,
    options: Arc<WsFederationOptions>,
    token_handlers: Arc<TokenHandlerRegistry>,
}

impl<P: FederationHostProvider> SignInResponseGenerator<P> {
    /// Creates a generator over the host provider and handler registry.
    pub fn new(
        provider: Arc<P>,
        options: Arc<WsFederationOptions>,
        token_handlers: Arc<TokenHandlerRegistry>,
    ) -> Self {
        Self {
            provider,
            options,
            token_handlers,
        }
    }

    /// Issues the token and wraps it into the outgoing sign-in message.
    ///
    /// Requires an authenticated subject on the validated request; the
    /// interaction checks run before this.
    pub async fn generate_response(
        &self,
        validated: &ValidatedWsFederationRequest,
    ) -> WsFederationResult<WsFederationMessage> {
        let subject = validated.subject.as_ref().ok_or_else(|| {
            WsFederationError::Internal(
                "response generation requires an authenticated subject".to_string(),
            )
        })?;
        let relying_party = validated.relying_party.as_ref();

        let token_type = relying_party
            .and_then(|rp| rp.token_type)
            .unwrap_or(self.options.default_token_type);

        let requested_types = self
            .provider
            .claim_types_for_scopes(&validated.scopes)
            .await?;
        let claims_service = ClaimsService::new(Arc::clone(&self.provider));
        let profile_claims = claims_service
            .get_claims(subject, &validated.client, &requested_types)
            .await?;

        let mapping = match relying_party {
            Some(rp) if !rp.claim_mapping.is_empty() => rp.claim_mapping.as_slice(),
            _ => self.options.default_claim_mapping.as_slice(),
        };
        let mut claims = map_claims(mapping, token_type, profile_claims);

        let name_id_format = relying_party
            .and_then(|rp| rp.name_identifier_format.as_deref())
            .unwrap_or(&self.options.default_name_identifier_format);
        ensure_mandatory_claims(&mut claims, subject, name_id_format);
        let authentication = authentication_information(&claims, subject);

        let signing = self
            .provider
            .signing_material()
            .await?
            .ok_or(WsFederationError::MissingSigningKey)?;
        let signature_algorithm = relying_party
            .and_then(|rp| rp.signature_algorithm)
            .unwrap_or(self.options.default_signature_algorithm);
        let digest_algorithm = relying_party
            .and_then(|rp| rp.digest_algorithm)
            .unwrap_or(self.options.default_digest_algorithm);

        let issuer = match self.options.issuer_uri.as_ref() {
            Some(issuer) => issuer.clone(),
            None => self.provider.base_url().await?,
        };

        let encryption = relying_party
            .and_then(|rp| rp.encryption_certificate.as_ref())
            .map(|certificate| EncryptionParameters {
                certificate_der: certificate.clone(),
                encryption_algorithm: relying_party
                    .and_then(|rp| rp.encryption_algorithm)
                    .unwrap_or(self.options.default_encryption_algorithm),
                key_wrap_algorithm: relying_party
                    .and_then(|rp| rp.key_wrap_algorithm)
                    .unwrap_or(self.options.default_key_wrap_algorithm),
            });

        let created = Utc::now();
        let expires = created + Duration::seconds(self.options.token_lifetime);

        let descriptor = SecurityTokenDescriptor {
            issuer,
            audience: validated.client.client_id.clone(),
            claims,
            created,
            expires,
            signing,
            signature_algorithm,
            digest_algorithm,
            authentication,
            encryption,
        };

        let token = self.token_handlers.create_token(token_type, &descriptor)?;
        debug!(
            realm = %validated.client.client_id,
            token_type = ?token.token_type,
            "issued security token"
        );
        let mut event = FederationEvent::builder(FederationEventType::TokenIssued)
            .realm(&validated.client.client_id)
            .subject(&subject.subject_id)
            .detail("token_type", token_type.uri());
        if let Some(session_id) = validated.session_id.as_deref() {
            event = event.session(session_id);
        }
        self.provider.raise_event(event.build()).await?;

        let ws_trust_version = relying_party
            .map_or(WsTrustVersion::Default, |rp| rp.ws_trust_version)
            .resolve(self.options.default_ws_trust_version);
        let mut response = RequestSecurityTokenResponse::new(
            validated.client.client_id.clone(),
            token,
            created,
            expires,
        );
        if let Some(context) = validated.message.wctx.as_deref() {
            response = response.with_context(context);
        }

        Ok(WsFederationMessage {
            wa: Some(actions::SIGN_IN.to_string()),
            wresult: Some(response.to_xml(ws_trust_version)),
            wctx: validated.message.wctx.clone(),
            ..WsFederationMessage::default()
        })
    }
}

/// Guarantees the three claims every assertion carries.
///
/// The name identifier ends up with a NameID-format property either way:
/// a synthesized claim gets the resolved format, a mapped claim keeps an
/// explicit format from the profile and is stamped only when it has none.
fn ensure_mandatory_claims(
    claims: &mut Vec<Claim>,
    subject: &AuthenticatedSubject,
    name_id_format: &str,
) {
    match claims
        .iter_mut()
        .find(|c| c.claim_type == claim_types::NAME_IDENTIFIER)
    {
        Some(claim) => {
            if claim.property(claim_properties::FORMAT).is_none() {
                claim.properties.insert(
                    claim_properties::FORMAT.to_string(),
                    name_id_format.to_string(),
                );
            }
        }
        None => {
            claims.insert(
                0,
                Claim::new(claim_types::NAME_IDENTIFIER, subject.subject_id.clone())
                    .with_property(claim_properties::FORMAT, name_id_format),
            );
        }
    }

    if !claims
        .iter()
        .any(|c| c.claim_type == claim_types::AUTHENTICATION_METHOD)
    {
        let method = if subject.authentication_method == amr::PASSWORD {
            authentication_methods::PASSWORD
        } else {
            authentication_methods::UNSPECIFIED
        };
        claims.push(Claim::new(claim_types::AUTHENTICATION_METHOD, method));
    }

    if !claims
        .iter()
        .any(|c| c.claim_type == claim_types::AUTHENTICATION_INSTANT)
    {
        claims.push(Claim::new(
            claim_types::AUTHENTICATION_INSTANT,
            subject
                .authentication_time
                .format(INSTANT_FORMAT)
                .to_string(),
        ));
    }
}

/// Builds the authentication statement input from the claim set.
///
/// Reads the method and instant claims rather than the subject, so a
/// profile-supplied method survives into the statement. An unparseable
/// instant claim falls back to the subject's recorded time.
fn authentication_information(
    claims: &[Claim],
    subject: &AuthenticatedSubject,
) -> Option<AuthenticationInformation> {
    let method = claims
        .iter()
        .find(|c| c.claim_type == claim_types::AUTHENTICATION_METHOD)?;
    let instant_claim = claims
        .iter()
        .find(|c| c.claim_type == claim_types::AUTHENTICATION_INSTANT)?;

    let instant = NaiveDateTime::parse_from_str(&instant_claim.value, INSTANT_FORMAT)
        .map_or(subject.authentication_time, |naive| naive.and_utc());

    Some(AuthenticationInformation {
        method: method.value.clone(),
        instant,
    })
}
