//! Explicit query helpers. Each function is one visible round trip and is
//! generic over the connection so it runs inside transactions too.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::LockType,
};

use crate::{
    dto::orders::OrderWithLines,
    entity::{
        CartItems, Items, OrderLines, Users, cart_items, items, order_lines, orders, users,
    },
};

pub async fn user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    Users::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await
}

/// The user's cart rows in insertion order, locked until the transaction ends.
pub async fn lock_cart_rows_for<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Vec<cart_items::Model>, DbErr> {
    CartItems::find()
        .filter(cart_items::Column::UserId.eq(user_id))
        .order_by_asc(cart_items::Column::Id)
        .lock(LockType::Update)
        .all(conn)
        .await
}

/// Cart rows joined with their item.
pub async fn cart_rows_with_items<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Vec<(cart_items::Model, items::Model)>, DbErr> {
    let rows = CartItems::find()
        .filter(cart_items::Column::UserId.eq(user_id))
        .order_by_asc(cart_items::Column::Id)
        .find_also_related(Items)
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(row, item)| item.map(|item| (row, item)))
        .collect())
}

/// Order lines grouped by order id, in insertion order.
pub async fn order_lines_for<C: ConnectionTrait>(
    conn: &C,
    order_ids: &[i32],
) -> Result<HashMap<i32, Vec<order_lines::Model>>, DbErr> {
    let mut grouped: HashMap<i32, Vec<order_lines::Model>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }
    let lines = OrderLines::find()
        .filter(order_lines::Column::OrderId.is_in(order_ids.to_vec()))
        .order_by_asc(order_lines::Column::Id)
        .all(conn)
        .await?;
    for line in lines {
        grouped.entry(line.order_id).or_default().push(line);
    }
    Ok(grouped)
}

/// Attach lines to each order, keeping the order of `orders`.
pub async fn with_lines<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<orders::Model>,
) -> Result<Vec<OrderWithLines>, DbErr> {
    let ids: Vec<i32> = orders.iter().map(|order| order.id).collect();
    let mut lines = order_lines_for(conn, &ids).await?;
    Ok(orders
        .into_iter()
        .map(|order| OrderWithLines {
            lines: lines
                .remove(&order.id)
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            order: order.into(),
        })
        .collect())
}

pub async fn item_is_ordered<C: ConnectionTrait>(conn: &C, item_id: i32) -> Result<bool, DbErr> {
    let line = OrderLines::find()
        .filter(order_lines::Column::ItemId.eq(item_id))
        .one(conn)
        .await?;
    Ok(line.is_some())
}
