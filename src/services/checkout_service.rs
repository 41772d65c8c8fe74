use crate::{
    audit,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    payments::{CheckoutSessionRequest, LineItem},
    repo,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const SUCCESS_PATH: &str = "/api/checkout/success";
pub const CANCEL_PATH: &str = "/api/checkout/cancel";

/// Ask the provider for a hosted checkout session covering the user's cart and
/// return the URL to send the browser to. Nothing is written locally until the
/// provider confirms payment through the webhook.
pub async fn create_checkout_session(state: &AppState, user: &AuthUser) -> AppResult<String> {
    let line_items: Vec<LineItem> = repo::cart_rows_with_items(&state.orm, user.user_id)
        .await?
        .into_iter()
        .map(|(row, item)| LineItem {
            price: item.price_id,
            quantity: row.quantity,
        })
        .collect();

    if line_items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let request = CheckoutSessionRequest {
        client_reference_id: user.user_id.to_string(),
        line_items,
        success_url: state.config.url(SUCCESS_PATH),
        cancel_url: state.config.url(CANCEL_PATH),
    };
    let session = state.payments.create_checkout_session(&request).await?;

    tracing::info!(
        user_id = user.user_id,
        session_id = %session.id,
        lines = request.line_items.len(),
        "checkout session created"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        "checkout_session",
        "orders",
        serde_json::json!({ "session_id": session.id }),
    )
    .await;

    Ok(session.url)
}

pub fn success_page() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(
        "Thanks for your order! Payment received, we are processing it.",
        serde_json::json!({}),
        Some(Meta::empty()),
    )
}

pub fn cancel_page() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(
        "Checkout cancelled. Your cart is unchanged.",
        serde_json::json!({}),
        Some(Meta::empty()),
    )
}
