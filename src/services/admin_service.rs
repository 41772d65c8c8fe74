use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use validator::Validate;

use crate::{
    audit,
    dto::{
        items::{ItemForm, ItemList, ItemPatch},
        orders::{OrderList, OrderWithLines, UpdateOrderStatusRequest},
    },
    entity::{
        Items, Orders,
        items::{ActiveModel as ItemActive, Column as ItemCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::{Item, Order},
    repo,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    state::AppState,
    uploads::{discard_image, save_image},
};

pub async fn list_all_orders(
    state: &AppState,
    _admin: &AdminUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt).order_by_asc(OrderCol::Id),
        SortOrder::Desc => finder
            .order_by_desc(OrderCol::CreatedAt)
            .order_by_desc(OrderCol::Id),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    _admin: &AdminUser,
    id: i32,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let data = repo::with_lines(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    admin: &AdminUser,
    id: i32,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    payload.validate()?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status.trim().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(admin.0.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_items(
    state: &AppState,
    _admin: &AdminUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Items::find().order_by_asc(ItemCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Item::from)
        .collect();

    Ok(ApiResponse::success(
        "Items",
        ItemList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_item(
    state: &AppState,
    admin: &AdminUser,
    form: ItemForm,
) -> AppResult<ApiResponse<Item>> {
    let image = save_image(&state.config.upload_dir, &form.image).await?;

    let inserted = ItemActive {
        id: NotSet,
        name: Set(form.name),
        price: Set(form.price),
        category: Set(form.category),
        image: Set(image.clone()),
        details: Set(form.details),
        price_id: Set(form.price_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await;
    let item = match inserted {
        Ok(item) => item,
        Err(err) => {
            discard_image(&state.config.upload_dir, &image).await;
            return Err(err.into());
        }
    };

    tracing::info!(item_id = item.id, "item created");
    audit::record(
        &state.orm,
        Some(admin.0.user_id),
        "item_create",
        "items",
        serde_json::json!({ "item_id": item.id, "name": item.name }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} added successfully!", item.name),
        item.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    admin: &AdminUser,
    id: i32,
    patch: ItemPatch,
) -> AppResult<ApiResponse<Item>> {
    let existing = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ItemActive = existing.into();
    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(price) = patch.price {
        active.price = Set(price);
    }
    if let Some(category) = patch.category {
        active.category = Set(category);
    }
    if let Some(details) = patch.details {
        active.details = Set(details);
    }
    if let Some(price_id) = patch.price_id {
        active.price_id = Set(price_id);
    }
    let mut new_image = None;
    if let Some(file) = patch.image.as_ref() {
        let url = save_image(&state.config.upload_dir, file).await?;
        active.image = Set(url.clone());
        new_image = Some(url);
    }
    let item = match active.update(&state.orm).await {
        Ok(item) => item,
        Err(err) => {
            if let Some(url) = new_image {
                discard_image(&state.config.upload_dir, &url).await;
            }
            return Err(err.into());
        }
    };

    audit::record(
        &state.orm,
        Some(admin.0.user_id),
        "item_update",
        "items",
        serde_json::json!({ "item_id": item.id }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} updated successfully!", item.name),
        item.into(),
        Some(Meta::empty()),
    ))
}

/// Cart rows holding the item go with it; items already sold stay.
pub async fn delete_item(
    state: &AppState,
    admin: &AdminUser,
    id: i32,
) -> AppResult<ApiResponse<Item>> {
    let existing = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if repo::item_is_ordered(&state.orm, id).await? {
        return Err(AppError::BadRequest(format!(
            "{} is part of an order and cannot be deleted",
            existing.name
        )));
    }

    let item = Item::from(existing.clone());
    existing.delete(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(admin.0.user_id),
        "item_delete",
        "items",
        serde_json::json!({ "item_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} deleted successfully!", item.name),
        item,
        Some(Meta::empty()),
    ))
}
