use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};

use crate::{
    dto::cart::{AddToCartRequest, CartView, RemoveFromCartResult},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).post(add_to_cart))
        .route("/{item_id}/{quantity}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart rows with subtotals and total", body = ApiResponse<CartView>),
        (status = 401, description = "Login required")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Cart row added", body = ApiResponse<CartItem>),
        (status = 400, description = "Unknown item or invalid quantity"),
        (status = 401, description = "Login required")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{item_id}/{quantity}",
    params(
        ("item_id" = i32, Path, description = "Item ID"),
        ("quantity" = i32, Path, description = "Quantity of the row to remove")
    ),
    responses(
        (status = 200, description = "At most one matching row removed", body = ApiResponse<RemoveFromCartResult>),
        (status = 401, description = "Login required")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path((item_id, quantity)): Path<(i32, i32)>,
) -> AppResult<Json<ApiResponse<RemoveFromCartResult>>> {
    let resp = cart_service::remove_from_cart(&state, &user, item_id, quantity).await?;
    Ok(Json(resp))
}
