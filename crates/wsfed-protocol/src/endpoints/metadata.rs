//! Federation metadata endpoint.
//!
//! Serves the WS-Federation metadata document: a SAML 2.0
//! `EntityDescriptor` whose `RoleDescriptor` is typed
//! `fed:SecurityTokenServiceType`, advertising the signing certificate,
//! the offered token types, and the passive endpoint address. Relying
//! parties consume this to configure trust without manual key exchange.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::error;
use uuid::Uuid;

use crate::constants::namespaces;
use crate::error::WsFederationResult;
use crate::signature::{SignaturePlacement, XmlSigner};
use crate::token::xml_escape;

use super::router::paths;
use super::signin::error_page;
use super::state::{FederationHostProvider, WsFederationState};

/// GET handler for the federation metadata document.
pub async fn metadata<P: FederationHostProvider>(
    State(state): State<WsFederationState<P>>,
) -> Response {
    match generate_metadata(&state).await {
        Ok(document) => {
            ([(header::CONTENT_TYPE, "application/xml")], document).into_response()
        }
        Err(err) => {
            error!(error = %err, "metadata generation failed");
            let status = StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_page(status, err.error_code(), "the metadata document could not be generated")
        }
    }
}

/// Generates the metadata document, signed when configured and key
/// material is available.
async fn generate_metadata<P: FederationHostProvider>(
    state: &WsFederationState<P>,
) -> WsFederationResult<String> {
    let options = state.options();
    let base_url = state.provider().base_url().await?;
    let base_url = base_url.trim_end_matches('/');

    let mut entity_id = options
        .issuer_uri
        .clone()
        .unwrap_or_else(|| base_url.to_string());
    if options.metadata.lowercase_entity_id {
        entity_id = entity_id.to_lowercase();
    }

    let endpoint = format!("{base_url}{}", paths::FEDERATION);
    let reference_id = format!("_{}", Uuid::now_v7());
    let material = state.provider().signing_material().await?;

    let key_descriptor = material.as_ref().map_or_else(String::new, |material| {
        format!(
            "<KeyDescriptor use=\"signing\"><KeyInfo xmlns=\"{}\"><X509Data><X509Certificate>{}</X509Certificate></X509Data></KeyInfo></KeyDescriptor>",
            namespaces::XML_DSIG,
            BASE64.encode(&material.certificate_der)
        )
    });

    let token_types: String = state
        .token_handlers()
        .supported_types()
        .iter()
        .map(|token_type| format!("<fed:TokenType Uri=\"{}\"></fed:TokenType>", token_type.uri()))
        .collect();

    let endpoint_reference = format!(
        "<EndpointReference xmlns=\"{}\"><Address>{}</Address></EndpointReference>",
        namespaces::WS_ADDRESSING_200408,
        xml_escape(&endpoint)
    );

    let document = format!(
        "<EntityDescriptor xmlns=\"{}\" xmlns:fed=\"{}\" ID=\"{reference_id}\" entityID=\"{}\">\
         <RoleDescriptor xmlns:xsi=\"{}\" xsi:type=\"fed:SecurityTokenServiceType\" protocolSupportEnumeration=\"{}\">\
         {key_descriptor}\
         <fed:TokenTypesOffered>{token_types}</fed:TokenTypesOffered>\
         <fed:SecurityTokenServiceEndpoint>{endpoint_reference}</fed:SecurityTokenServiceEndpoint>\
         <fed:PassiveRequestorEndpoint>{endpoint_reference}</fed:PassiveRequestorEndpoint>\
         </RoleDescriptor></EntityDescriptor>",
        namespaces::SAML2_METADATA,
        namespaces::WS_FEDERATION,
        xml_escape(&entity_id),
        namespaces::XSI,
        namespaces::WS_FEDERATION,
    );

    if options.metadata.sign_metadata
        && let Some(material) = material
    {
        let signer = XmlSigner::new(
            material,
            options.default_signature_algorithm,
            options.default_digest_algorithm,
        );
        return signer.sign(&document, &reference_id, SignaturePlacement::FirstChild);
    }

    Ok(document)
}
