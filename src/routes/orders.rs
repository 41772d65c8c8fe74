use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::OrderHistory, error::AppResult, middleware::auth::AuthUser,
    response::ApiResponse, services::order_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_my_orders))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "The current user's orders with their lines", body = ApiResponse<OrderHistory>),
        (status = 401, description = "Login required")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderHistory>>> {
    let resp = order_service::list_my_orders(&state, &user).await?;
    Ok(Json(resp))
}
