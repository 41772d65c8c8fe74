use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use chrono::Utc;

use crate::{
    error::WebhookError,
    services::fulfillment_service::{self, MAX_WEBHOOK_BODY_BYTES},
    state::AppState,
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stripe", post(stripe_webhook))
        // The handler enforces its own limit so oversize bodies get the usual 400.
        .layer(DefaultBodyLimit::disable())
}

#[utoipa::path(
    post,
    path = "/api/webhooks/stripe",
    request_body(content = String, description = "Raw signed event", content_type = "application/json"),
    params(("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    responses(
        (status = 200, description = "Event acknowledged, empty body"),
        (status = 400, description = "Oversized, unsigned or malformed event, body {}"),
        (status = 500, description = "Datastore failure, provider retries")
    ),
    tag = "Webhooks"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, WebhookError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_WEBHOOK_BODY_BYTES) {
        return Err(WebhookError::PayloadTooLarge(MAX_WEBHOOK_BODY_BYTES));
    }
    let payload = to_bytes(body, MAX_WEBHOOK_BODY_BYTES)
        .await
        .map_err(|_| WebhookError::PayloadTooLarge(MAX_WEBHOOK_BODY_BYTES))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    fulfillment_service::handle_webhook(&state, &payload, signature, Utc::now().timestamp())
        .await?;
    Ok(StatusCode::OK)
}
