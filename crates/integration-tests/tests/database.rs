//! End-to-end flows against a real `PostgreSQL` database.
//!
//! Run with `cargo test -p aurelia-integration-tests -- --ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use aurelia_core::inventory::StockLevel;
use aurelia_core::{AdminRole, Money, OrderId, OrderStatus, ProductId, Sku, Slug};
use aurelia_integration_tests::{
    TestApp, body_json, get, migrated_pool, post_json, request, session_cookie,
};
use aurelia_storefront::db::orders::StatusChangeError;
use aurelia_storefront::db::{InventoryRepository, OrderRepository, ProductRepository};
use aurelia_storefront::models::catalog::NewProduct;

const PASSWORD: &str = "correct horse battery";

fn unique(prefix: &str) -> String {
    format!("{prefix}{}", &Uuid::new_v4().simple().to_string()[..10])
}

/// Insert a product with `quantity` in stock.
async fn create_product(app: &TestApp, price_cents: u32, quantity: i32) -> ProductId {
    let tag = unique("t");
    let new = NewProduct {
        category_id: None,
        sku: Sku::parse(&tag.to_uppercase()).unwrap(),
        name: format!("Test Piece {tag}"),
        slug: None,
        description: String::new(),
        material: Some("Silver".to_string()),
        price: Money::from_cents(price_cents),
        sale_price: None,
        images: Vec::new(),
        is_featured: false,
        initial_quantity: quantity,
        min_threshold: None,
    };
    let slug = Slug::parse(&format!("test-piece-{tag}")).unwrap();
    ProductRepository::new(&app.pool)
        .create(&new, &slug)
        .await
        .unwrap()
        .id
}

async fn stock(app: &TestApp, product_id: ProductId) -> i32 {
    InventoryRepository::new(&app.pool)
        .get(product_id)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

/// Register a fresh customer, optionally on an existing session, and return
/// the new session cookie with the username.
async fn register_with(app: &TestApp, cookie: Option<&str>) -> (String, String) {
    let username = unique("u");
    let body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD
    });
    let response = app
        .send(post_json("/api/auth/register", &body, cookie))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    (session_cookie(&response).unwrap(), username)
}

async fn register(app: &TestApp) -> String {
    register_with(app, None).await.0
}

async fn add_to_cart(
    app: &TestApp,
    product_id: ProductId,
    quantity: u32,
    cookie: Option<&str>,
) -> (Value, Option<String>) {
    let body = json!({"product_id": product_id, "quantity": quantity});
    let response = app.send(post_json("/api/cart/items", &body, cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = session_cookie(&response);
    (body_json(response).await, set_cookie)
}

fn money(value: &Value) -> Money {
    serde_json::from_value(value.clone()).unwrap()
}

fn address() -> Value {
    json!({
        "full_name": "Ada Lovelace",
        "line1": "12 St James's Square",
        "city": "London",
        "postal_code": "SW1Y 4JH",
        "country": "GB"
    })
}

fn checkout_body() -> Value {
    json!({"shipping_address": address(), "payment_method": "card"})
}

/// Place an order for `quantity` of a new product and return the order JSON.
async fn place_order(app: &TestApp, cookie: &str, product_id: ProductId, quantity: u32) -> Value {
    add_to_cart(app, product_id, quantity, Some(cookie)).await;
    let response = app
        .send(post_json("/api/orders", &checkout_body(), Some(cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn order_id(order: &Value) -> OrderId {
    OrderId::new(i32::try_from(order["id"].as_i64().unwrap()).unwrap())
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_readiness_with_database() {
    let app = TestApp::new(migrated_pool().await);
    let response = app.send(get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_guest_cart_add_and_remove() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 4_000, 10).await;

    let (_, cookie) = add_to_cart(&app, product_id, 1, None).await;
    let cookie = cookie.unwrap();

    // Adding the same product again increases the existing line.
    let (cart, _) = add_to_cart(&app, product_id, 2, Some(&cookie)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["item_count"], 3);
    assert_eq!(money(&cart["subtotal"]), Money::from_cents(12_000));
    assert_eq!(money(&cart["shipping"]), Money::from_cents(1_500));

    let item_id = cart["items"][0]["id"].as_i64().unwrap();
    let response = app
        .send(request(
            Method::DELETE,
            &format!("/api/cart/items/{item_id}"),
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = body_json(response).await;
    assert_eq!(cart["item_count"], 0);
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(money(&cart["total"]), Money::ZERO);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_partial_remove_keeps_line() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 1_500, 10).await;

    let (cart, cookie) = add_to_cart(&app, product_id, 3, None).await;
    let cookie = cookie.unwrap();
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let response = app
        .send(request(
            Method::DELETE,
            &format!("/api/cart/items/{item_id}?quantity=1"),
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = body_json(response).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["item_count"], 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_setting_quantity_to_zero_removes_line() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 1_500, 10).await;

    let (cart, cookie) = add_to_cart(&app, product_id, 2, None).await;
    let cookie = cookie.unwrap();
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let response = app
        .send(request(
            Method::PATCH,
            &format!("/api/cart/items/{item_id}"),
            Some(&json!({"quantity": 0})),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = body_json(response).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_cart_rejects_more_than_stock() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 2_500, 2).await;

    let body = json!({"product_id": product_id, "quantity": 3});
    let response = app.send(post_json("/api/cart/items", &body, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_guest_cart_adopted_at_register() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 2_000, 10).await;

    let (_, guest) = add_to_cart(&app, product_id, 2, None).await;
    let (cookie, _) = register_with(&app, guest.as_deref()).await;

    let cart = body_json(app.send(get("/api/cart", Some(&cookie))).await).await;
    assert_eq!(cart["item_count"], 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_guest_cart_merged_at_login() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 2_000, 10).await;

    let (cookie, username) = register_with(&app, None).await;
    add_to_cart(&app, product_id, 1, Some(&cookie)).await;

    let response = app
        .send(request(Method::POST, "/api/auth/logout", None, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Same browser, now anonymous: a separate guest cart.
    let (guest_cart, _) = add_to_cart(&app, product_id, 2, Some(&cookie)).await;
    assert_eq!(guest_cart["item_count"], 2);

    let body = json!({"login": username, "password": PASSWORD});
    let response = app
        .send(post_json("/api/auth/login", &body, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();

    let cart = body_json(app.send(get("/api/cart", Some(&cookie))).await).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["item_count"], 3);
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_favorite_conflicts() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 9_900, 1).await;
    let cookie = register(&app).await;

    let body = json!({"product_id": product_id});
    let response = app
        .send(post_json("/api/favorites", &body, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(post_json("/api/favorites", &body, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .send(request(
            Method::DELETE,
            &format!("/api/favorites/{product_id}"),
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// Checkout & orders
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_checkout_and_cancel() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 3_000, 5).await;
    let cookie = register(&app).await;

    let order = place_order(&app, &cookie, product_id, 2).await;

    let subtotal = money(&order["subtotal"]);
    let shipping = money(&order["shipping_cost"]);
    assert_eq!(subtotal, Money::from_cents(6_000));
    assert_eq!(money(&order["total"]), subtotal + shipping);
    assert_eq!(order["status"], "pending");
    assert_eq!(stock(&app, product_id).await, 3);

    let tracking = order["shipping"]["tracking_number"].as_str().unwrap();
    let response = app
        .send(get(&format!("/api/tracking/{tracking}"), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The cart is emptied by checkout.
    let cart = body_json(app.send(get("/api/cart", Some(&cookie))).await).await;
    assert_eq!(cart["item_count"], 0);

    let number = order["order_number"].as_str().unwrap();
    let cancel = format!("/api/orders/{number}/cancel");
    let response = app
        .send(request(Method::POST, &cancel, None, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "cancelled");
    assert_eq!(stock(&app, product_id).await, 5);

    let response = app
        .send(request(Method::POST, &cancel, None, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stock(&app, product_id).await, 5);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_short_stock_checkout_rolls_back() {
    let app = TestApp::new(migrated_pool().await);
    let plenty = create_product(&app, 3_000, 5).await;
    let scarce = create_product(&app, 3_000, 1).await;
    let cookie = register(&app).await;

    add_to_cart(&app, plenty, 2, Some(&cookie)).await;
    add_to_cart(&app, scarce, 1, Some(&cookie)).await;

    // The last one sells elsewhere before this customer checks out.
    InventoryRepository::new(&app.pool)
        .set(scarce, StockLevel::new(0, 0).unwrap())
        .await
        .unwrap();

    let response = app
        .send(post_json("/api/orders", &checkout_body(), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(stock(&app, plenty).await, 5);
    assert_eq!(stock(&app, scarce).await, 0);
    let cart = body_json(app.send(get("/api/cart", Some(&cookie))).await).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_checkout_total_over_max_rejected() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 999_999_900, 200).await;

    let (_, cookie) = add_to_cart(&app, product_id, 20, None).await;
    let cookie = cookie.unwrap();

    let body = json!({
        "email": "collector@example.com",
        "shipping_address": address(),
        "payment_method": "bank_transfer"
    });
    let response = app
        .send(post_json("/api/orders", &body, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(stock(&app, product_id).await, 200);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_guest_checkout_requires_email() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 2_000, 5).await;

    let (_, cookie) = add_to_cart(&app, product_id, 1, None).await;
    let cookie = cookie.unwrap();

    let response = app
        .send(post_json("/api/orders", &checkout_body(), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stock(&app, product_id).await, 5);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_checkout_with_empty_cart() {
    let app = TestApp::new(migrated_pool().await);
    let cookie = register(&app).await;

    let response = app
        .send(post_json("/api/orders", &checkout_body(), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_orders_are_private() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 1_000, 3).await;
    let owner = register(&app).await;
    let stranger = register(&app).await;

    let order = place_order(&app, &owner, product_id, 1).await;
    let number = order["order_number"].as_str().unwrap();

    let response = app
        .send(get(&format!("/api/orders/{number}"), Some(&stranger)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_customer_cannot_cancel_processing_order() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 1_000, 3).await;
    let cookie = register(&app).await;

    let order = place_order(&app, &cookie, product_id, 1).await;
    let id = order_id(&order);
    let orders = OrderRepository::new(&app.pool);
    orders.update_status(id, OrderStatus::Processing).await.unwrap();

    // The pending check happens on the locked row, not on an earlier read.
    let result = orders.cancel_pending(id).await;
    assert!(matches!(
        result,
        Err(StatusChangeError::NotInStatus {
            expected: OrderStatus::Pending,
            actual: OrderStatus::Processing,
        })
    ));

    let number = order["order_number"].as_str().unwrap();
    let response = app
        .send(request(
            Method::POST,
            &format!("/api/orders/{number}/cancel"),
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let current = orders.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Processing);
    assert_eq!(stock(&app, product_id).await, 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_shipping_and_delivery_append_tracking_events() {
    let app = TestApp::new(migrated_pool().await);
    let product_id = create_product(&app, 1_000, 3).await;
    let cookie = register(&app).await;
    let admin = app.admin_cookie(AdminRole::Admin).await;

    let order = place_order(&app, &cookie, product_id, 1).await;
    let id = order["id"].as_i64().unwrap();
    let tracking = order["shipping"]["tracking_number"].as_str().unwrap();
    let status_uri = format!("/api/admin/orders/{id}/status");
    let tracking_uri = format!("/api/tracking/{tracking}");

    for status in ["processing", "shipped"] {
        let response = app
            .send(request(
                Method::PATCH,
                &status_uri,
                Some(&json!({"status": status})),
                Some(&admin),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "{status}");
    }

    let shipment = body_json(app.send(get(&tracking_uri, None)).await).await;
    assert_eq!(shipment["status"], "in_transit");
    assert_eq!(shipment["history"].as_array().unwrap().len(), 2);

    let response = app
        .send(request(
            Method::PATCH,
            &status_uri,
            Some(&json!({"status": "delivered"})),
            Some(&admin),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let shipment = body_json(app.send(get(&tracking_uri, None)).await).await;
    assert_eq!(shipment["status"], "delivered");
    assert_eq!(shipment["history"].as_array().unwrap().len(), 3);
}
