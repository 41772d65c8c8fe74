use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::items::ItemList,
    entity::{Items, items::Column},
    error::{AppError, AppResult},
    models::Item,
    response::{ApiResponse, Meta},
    routes::params::{ItemQuery, SortOrder},
    state::AppState,
};

pub async fn list_items(state: &AppState, query: ItemQuery) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    let search = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty());
    if let Some(search) = search {
        condition = condition.add(Column::Name.contains(search));
    }
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }

    let mut finder = Items::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder.order_by_asc(Column::Id),
        SortOrder::Desc => finder.order_by_desc(Column::Id),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Item::from)
        .collect();

    let message = match search {
        Some(search) => format!("Results for \"{search}\""),
        None => "Items".to_string(),
    };
    Ok(ApiResponse::success(
        message,
        ItemList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_item(state: &AppState, id: i32) -> AppResult<ApiResponse<Item>> {
    let item = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Item::from)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Item", item, None))
}
