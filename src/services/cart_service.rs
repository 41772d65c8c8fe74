use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use validator::Validate;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartLine, CartView, RemoveFromCartResult},
    entity::{CartItems, Items, cart_items},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Item},
    payments::LineItem,
    repo,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = repo::cart_rows_with_items(&state.orm, user.user_id).await?;

    let mut total = 0.0;
    let mut lines = Vec::with_capacity(rows.len());
    let mut line_items = Vec::with_capacity(rows.len());
    for (row, item) in rows {
        let subtotal = item.price * f64::from(row.quantity);
        total += subtotal;
        line_items.push(LineItem {
            price: item.price_id.clone(),
            quantity: row.quantity,
        });
        lines.push(CartLine {
            id: row.id,
            item: Item::from(item),
            quantity: row.quantity,
            subtotal,
        });
    }

    Ok(ApiResponse::success(
        "OK",
        CartView {
            lines,
            total,
            line_items,
        },
        Some(Meta::empty()),
    ))
}

/// Every add creates its own row; repeated adds of one item are not merged.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;

    let item = Items::find_by_id(payload.item_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("item not found".to_string()))?;

    let row = cart_items::ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        item_id: Set(item.id),
        quantity: Set(payload.quantity),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "item_id": item.id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} successfully added to the cart.", item.name),
        row.into(),
        Some(Meta::empty()),
    ))
}

/// Deletes the oldest row matching (user, item, quantity) exactly. No match is
/// not an error.
pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    item_id: i32,
    quantity: i32,
) -> AppResult<ApiResponse<RemoveFromCartResult>> {
    let row = CartItems::find()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .filter(cart_items::Column::ItemId.eq(item_id))
        .filter(cart_items::Column::Quantity.eq(quantity))
        .order_by_asc(cart_items::Column::Id)
        .one(&state.orm)
        .await?;

    let removed = match row {
        Some(row) => {
            let row_id = row.id;
            row.delete(&state.orm).await?;
            audit::record(
                &state.orm,
                Some(user.user_id),
                "cart_remove",
                "cart_items",
                serde_json::json!({ "cart_item_id": row_id, "item_id": item_id, "quantity": quantity }),
            )
            .await;
            true
        }
        None => false,
    };

    let message = if removed {
        "Removed from cart"
    } else {
        "Nothing to remove"
    };
    Ok(ApiResponse::success(
        message,
        RemoveFromCartResult { removed },
        Some(Meta::empty()),
    ))
}
