mod common;

use axum::http::StatusCode;
use storefront::{
    dto::cart::AddToCartRequest,
    middleware::auth::AuthUser,
    services::cart_service,
};

fn auth(user_id: i32) -> AuthUser {
    AuthUser {
        user_id,
        email: "buyer@example.com".into(),
        email_confirmed: true,
    }
}

#[tokio::test]
async fn repeated_adds_keep_separate_rows() {
    let app = common::spawn_app().await;
    let user = common::create_user(&app, "buyer@example.com", false).await;
    let item = common::create_item(&app, "Shirt", 12.5, "price_shirt").await;
    let token = common::bearer(user.id);

    for quantity in [2, 3] {
        let response = app
            .send(common::json_request(
                "POST",
                "/api/cart",
                Some(&token),
                serde_json::json!({ "item_id": item.id, "quantity": quantity }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = common::body_json(response).await;
        assert_eq!(body["message"], "Shirt successfully added to the cart.");
    }

    let response = app
        .send(common::empty_request("GET", "/api/cart", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let lines = body["data"]["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(body["data"]["total"].as_f64().unwrap(), 12.5 * 5.0);
    assert_eq!(
        body["data"]["line_items"],
        serde_json::json!([
            { "price": "price_shirt", "quantity": 2 },
            { "price": "price_shirt", "quantity": 3 }
        ])
    );
}

#[tokio::test]
async fn remove_deletes_exactly_one_matching_row() {
    let app = common::spawn_app().await;
    let user = common::create_user(&app, "buyer@example.com", false).await;
    let item = common::create_item(&app, "Shirt", 10.0, "price_shirt").await;
    common::add_cart_row(&app, user.id, item.id, 2).await;
    common::add_cart_row(&app, user.id, item.id, 2).await;
    common::add_cart_row(&app, user.id, item.id, 3).await;
    let user = auth(user.id);

    let removed = cart_service::remove_from_cart(&app.state, &user, item.id, 2)
        .await
        .unwrap();
    assert!(removed.data.unwrap().removed);

    let cart = cart_service::view_cart(&app.state, &user).await.unwrap().data.unwrap();
    let quantities: Vec<i32> = cart.lines.iter().map(|line| line.quantity).collect();
    assert_eq!(quantities, vec![2, 3]);

    let missing = cart_service::remove_from_cart(&app.state, &user, item.id, 7)
        .await
        .unwrap();
    assert!(!missing.data.unwrap().removed);
    let cart = cart_service::view_cart(&app.state, &user).await.unwrap().data.unwrap();
    assert_eq!(cart.lines.len(), 2);
    assert_eq!(cart.total, 50.0);
}

#[tokio::test]
async fn remove_route_is_a_noop_for_unknown_rows() {
    let app = common::spawn_app().await;
    let user = common::create_user(&app, "buyer@example.com", false).await;
    let token = common::bearer(user.id);

    let response = app
        .send(common::empty_request("DELETE", "/api/cart/42/1", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["removed"], false);
}

#[tokio::test]
async fn add_rejects_unknown_items_and_bad_quantities() {
    let app = common::spawn_app().await;
    let user = common::create_user(&app, "buyer@example.com", false).await;
    let item = common::create_item(&app, "Shirt", 10.0, "price_shirt").await;
    let user = auth(user.id);

    let unknown = cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            item_id: item.id + 100,
            quantity: 1,
        },
    )
    .await;
    assert!(unknown.is_err());

    let zero = cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            item_id: item.id,
            quantity: 0,
        },
    )
    .await;
    assert!(zero.is_err());

    let cart = cart_service::view_cart(&app.state, &user).await.unwrap().data.unwrap();
    assert!(cart.lines.is_empty());
}

#[tokio::test]
async fn cart_requires_login() {
    let app = common::spawn_app().await;

    let response = app.send(common::empty_request("GET", "/api/cart", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "You must login first!");

    let response = app
        .send(common::empty_request("GET", "/api/cart", Some("Bearer garbage")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_relays_provider_errors() {
    let app = common::spawn_app().await;
    let user = common::create_user(&app, "buyer@example.com", false).await;
    let token = common::bearer(user.id);

    let response = app
        .send(common::empty_request("POST", "/api/checkout", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.gateway.requests.lock().unwrap().is_empty());

    let item = common::create_item(&app, "Shirt", 10.0, "price_gone").await;
    common::add_cart_row(&app, user.id, item.id, 1).await;
    *app.gateway.reject_with.lock().unwrap() = Some("No such price: 'price_gone'".into());

    let response = app
        .send(common::empty_request("POST", "/api/checkout", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_bytes(response).await;
    assert_eq!(body, b"No such price: 'price_gone'");
}

#[tokio::test]
async fn catalog_search_and_detail() {
    let app = common::spawn_app().await;
    common::create_item(&app, "Blue Shirt", 10.0, "price_1").await;
    common::create_item(&app, "Red Shirt", 11.0, "price_2").await;
    common::create_item(&app, "Mug", 5.0, "price_3").await;

    let response = app
        .send(common::empty_request("GET", "/api/items?q=Shirt", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["message"], "Results for \"Shirt\"");

    let response = app
        .send(common::empty_request("GET", "/api/items?page=2&per_page=2", None))
        .await;
    let body = common::body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .send(common::empty_request(
            "GET",
            "/api/items?page=9223372036854775807&per_page=100",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 3);

    let response = app
        .send(common::empty_request("GET", "/api/items/999", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
