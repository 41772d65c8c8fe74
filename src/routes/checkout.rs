use axum::{
    Json, Router,
    extract::State,
    response::Redirect,
    routing::{get, post},
};

use crate::{
    error::AppResult, middleware::auth::AuthUser, response::ApiResponse,
    services::checkout_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_checkout_session))
        .route("/success", get(success))
        .route("/cancel", get(cancel))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    responses(
        (status = 303, description = "Redirect to the hosted checkout page"),
        (status = 400, description = "Cart is empty"),
        (status = 401, description = "Login required"),
        (status = 502, description = "Provider error message as plain text")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Redirect> {
    let url = checkout_service::create_checkout_session(&state, &user).await?;
    Ok(Redirect::to(&url))
}

#[utoipa::path(
    get,
    path = "/api/checkout/success",
    responses((status = 200, description = "Payment completed")),
    tag = "Checkout"
)]
pub async fn success() -> Json<ApiResponse<serde_json::Value>> {
    Json(checkout_service::success_page())
}

#[utoipa::path(
    get,
    path = "/api/checkout/cancel",
    responses((status = 200, description = "Payment cancelled")),
    tag = "Checkout"
)]
pub async fn cancel() -> Json<ApiResponse<serde_json::Value>> {
    Json(checkout_service::cancel_page())
}
