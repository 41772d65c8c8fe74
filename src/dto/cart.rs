use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{models::Item, payments::LineItem};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddToCartRequest {
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    /// Cart row id.
    pub id: i32,
    pub item: Item,
    pub quantity: i32,
    pub subtotal: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: f64,
    /// What checkout will send to the payment provider.
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemoveFromCartResult {
    pub removed: bool,
}
