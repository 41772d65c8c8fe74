use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::orders::OrderHistory,
    entity::{Orders, orders::Column as OrderCol},
    error::AppResult,
    middleware::auth::AuthUser,
    repo,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// The user's orders, newest first, each with its lines.
pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderHistory>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;
    let total = orders.len() as i64;
    let items = repo::with_lines(&state.orm, orders).await?;

    Ok(ApiResponse::success(
        "Ok",
        OrderHistory { items },
        Some(Meta {
            page: None,
            per_page: None,
            total: Some(total),
        }),
    ))
}
