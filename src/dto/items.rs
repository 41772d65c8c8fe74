use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::Item,
    uploads::{MultipartForm, UploadedFile},
};

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ItemList {
    #[schema(value_type = Vec<Item>)]
    pub items: Vec<Item>,
}

/// Admin "add item" form, sent as `multipart/form-data`.
#[derive(Debug, Validate, ToSchema)]
pub struct ItemForm {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(range(min = 0.01))]
    pub price: f64,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(length(min = 1, max = 250))]
    pub details: String,
    #[validate(length(min = 1, max = 250))]
    pub price_id: String,
    #[schema(value_type = String, format = Binary)]
    pub image: UploadedFile,
}

/// Admin "edit item" form; absent fields keep their current value.
#[derive(Debug, Default, Validate, ToSchema)]
pub struct ItemPatch {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(range(min = 0.01))]
    pub price: Option<f64>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 250))]
    pub details: Option<String>,
    #[validate(length(min = 1, max = 250))]
    pub price_id: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<UploadedFile>,
}

impl TryFrom<MultipartForm> for ItemForm {
    type Error = AppError;

    fn try_from(mut form: MultipartForm) -> AppResult<Self> {
        let item = Self {
            name: form.required("name")?,
            price: parse_price(&form.required("price")?)?,
            category: form.required("category")?,
            details: form.required("details")?,
            price_id: form.required("price_id")?,
            image: form
                .file
                .take()
                .ok_or_else(|| AppError::BadRequest("image is required".into()))?,
        };
        item.validate()?;
        Ok(item)
    }
}

impl TryFrom<MultipartForm> for ItemPatch {
    type Error = AppError;

    fn try_from(mut form: MultipartForm) -> AppResult<Self> {
        let patch = Self {
            name: form.optional("name"),
            price: form.optional("price").as_deref().map(parse_price).transpose()?,
            category: form.optional("category"),
            details: form.optional("details"),
            price_id: form.optional("price_id"),
            image: form.file.take(),
        };
        patch.validate()?;
        Ok(patch)
    }
}

fn parse_price(raw: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| AppError::BadRequest(format!("invalid price {raw:?}")))
}
