use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State, http::HeaderMap, response::IntoResponse};

use crate::ingest;
use crate::server::AppState;
use crate::server::response::{ApiError, WebhookAck};
use crate::types::WebhookEnvelope;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

/// Inbound `repo_updated` deliveries from the upstream crawler.
///
/// Order matters: signature presence, then schema validation, then the
/// event-type check, then the transactional pipeline. Nothing is written
/// before validation passes.
pub async fn receive_repo_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if state.webhook_secret.is_some() {
        // Presence check only. The signature value is not cryptographically
        // verified against the secret; see the deployment notes.
        if !headers.contains_key(SIGNATURE_HEADER) || !headers.contains_key(TIMESTAMP_HEADER) {
            return Err(crate::error::Error::MissingSignature.into());
        }
    }

    let envelope = WebhookEnvelope::from_slice(&body)?;
    envelope.ensure_supported()?;

    let receipt = ingest::process_delivery(&state.store, &envelope.data)?;

    tracing::info!(
        repo_id = %receipt.repo_id,
        apps = receipt.apps_count,
        "Processed repo_updated delivery"
    );

    Ok(Json(WebhookAck::processed(receipt)))
}
