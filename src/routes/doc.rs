use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartLine, CartView, RemoveFromCartResult},
        items::{ItemForm, ItemList, ItemPatch},
        orders::{OrderHistory, OrderList, OrderWithLines, UpdateOrderStatusRequest},
    },
    models::{CartItem, Item, Order, OrderLine, User},
    payments::LineItem,
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, checkout, health, items, orders, params, webhooks},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::resend_confirmation,
        auth::confirm_email,
        items::list_items,
        items::get_item,
        cart::view_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        checkout::create_checkout_session,
        checkout::success,
        checkout::cancel,
        orders::list_my_orders,
        webhooks::stripe_webhook,
        admin::list_all_orders,
        admin::get_order,
        admin::update_order_status,
        admin::list_items,
        admin::create_item,
        admin::update_item,
        admin::delete_item
    ),
    components(
        schemas(
            User,
            Item,
            CartItem,
            Order,
            OrderLine,
            LineItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            CartLine,
            CartView,
            RemoveFromCartResult,
            ItemList,
            ItemForm,
            ItemPatch,
            OrderList,
            OrderHistory,
            OrderWithLines,
            UpdateOrderStatusRequest,
            params::Pagination,
            params::ItemQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<CartView>,
            ApiResponse<OrderList>,
            ApiResponse<OrderHistory>,
            ApiResponse<OrderWithLines>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and email confirmation"),
        (name = "Items", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Checkout", description = "Hosted checkout"),
        (name = "Orders", description = "Order history"),
        (name = "Webhooks", description = "Payment provider callbacks"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/cart/{item_id}/{quantity}",
            "/api/checkout",
            "/api/webhooks/stripe",
            "/api/admin/items/{id}",
            "/api/auth/confirm/{token}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
