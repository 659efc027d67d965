//! Router tests that never reach the database.
//!
//! Authentication, authorization and input validation are all checked
//! before a handler touches `PostgreSQL`, so these run against a lazily
//! connected pool.

use axum::http::{HeaderValue, Method, StatusCode};
use serde_json::json;

use aurelia_core::AdminRole;
use aurelia_integration_tests::{TestApp, body_json, body_text, get, post_json, request};

// ============================================================================
// Health & middleware
// ============================================================================

#[tokio::test]
async fn test_health_returns_ok() {
    let app = TestApp::offline();
    let response = app.send(get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::offline();
    let response = app.send(get("/health", None)).await;
    let headers = response.headers();

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert!(headers.contains_key("content-security-policy"));
    assert!(
        headers["cache-control"]
            .to_str()
            .unwrap_or_default()
            .contains("no-store")
    );
}

#[tokio::test]
async fn test_request_id_generated() {
    let app = TestApp::offline();
    let response = app.send(get("/health", None)).await;

    let id = response.headers()["x-request-id"].to_str().unwrap_or_default();
    assert_eq!(id.len(), 36, "expected a UUID, got {id:?}");
}

#[tokio::test]
async fn test_request_id_echoed() {
    let app = TestApp::offline();
    let mut req = get("/health", None);
    req.headers_mut()
        .insert("x-request-id", HeaderValue::from_static("edge-1234"));
    let response = app.send(req).await;

    assert_eq!(response.headers()["x-request-id"], "edge-1234");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_customer_routes_require_login() {
    let app = TestApp::offline();

    for uri in ["/api/auth/me", "/api/orders", "/api/favorites"] {
        let response = app.send(get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body = body_json(response).await;
        assert!(body["error"].is_string(), "{uri}: {body}");
    }
}

#[tokio::test]
async fn test_admin_routes_require_admin_session() {
    let app = TestApp::offline();

    let response = app.send(get("/api/admin/orders", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A customer session is not an admin session.
    let cookie = app.customer_cookie(7, "shopper").await;
    let response = app.send(get("/api/admin/orders", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_me_returns_session_identity() {
    let app = TestApp::offline();
    let cookie = app.admin_cookie(AdminRole::Viewer).await;

    let response = app.send(get("/api/admin/auth/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "backoffice");
    assert_eq!(body["role"], "viewer");
}

#[tokio::test]
async fn test_viewer_cannot_write() {
    let app = TestApp::offline();
    let cookie = app.admin_cookie(AdminRole::Viewer).await;

    let product = json!({
        "sku": "RNG-900",
        "name": "Test Ring",
        "price": "10.00"
    });
    let response = app
        .send(post_json("/api/admin/products", &product, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(request(
            Method::DELETE,
            "/api/admin/contact/1",
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_super_admin_manages_admins() {
    let app = TestApp::offline();
    let cookie = app.admin_cookie(AdminRole::Admin).await;

    let response = app.send(get("/api/admin/admins", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let app = TestApp::offline();
    let response = app
        .send(request(Method::POST, "/api/auth/logout", None, None))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// Validation (400)
// ============================================================================

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let app = TestApp::offline();
    let body = json!({
        "username": "ada",
        "email": "not-an-email",
        "password": "correct horse battery"
    });
    let response = app.send(post_json("/api/auth/register", &body, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = TestApp::offline();
    let body = json!({
        "username": "ada",
        "email": "ada@example.com",
        "password": "short"
    });
    let response = app.send(post_json("/api/auth/register", &body, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::offline();
    let response = app
        .send(post_json("/api/contact", &json!({"name": "Ada"}), None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_contact_requires_name_and_message() {
    let app = TestApp::offline();
    let body = json!({
        "name": "  ",
        "email": "ada@example.com",
        "message": "Hello"
    });
    let response = app.send(post_json("/api/contact", &body, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "message": "x".repeat(5001)
    });
    let response = app.send(post_json("/api/contact", &body, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_to_cart_rejects_bad_quantity() {
    let app = TestApp::offline();

    for quantity in [0, 100] {
        let body = json!({"product_id": 1, "quantity": quantity});
        let response = app.send(post_json("/api/cart/items", &body, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "quantity {quantity}");
    }
}

#[tokio::test]
async fn test_product_listing_rejects_page_size() {
    let app = TestApp::offline();
    let response = app.send(get("/api/products?per_page=500", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(get("/api/products?sort=cheapest", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_tracking_number() {
    let app = TestApp::offline();
    let response = app.send(get("/api/tracking/XX123", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_stock_level_rejected() {
    let app = TestApp::offline();
    let cookie = app.admin_cookie(AdminRole::Admin).await;
    let body = json!({"quantity": -1, "min_threshold": 5});
    let response = app
        .send(request(
            Method::PUT,
            "/api/admin/inventory/1",
            Some(&body),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_price_over_max_rejected() {
    let app = TestApp::offline();
    let cookie = app.admin_cookie(AdminRole::Admin).await;

    let product = json!({
        "sku": "RNG-901",
        "name": "Crown Ring",
        "price": "1000000000.00"
    });
    let response = app
        .send(post_json("/api/admin/products", &product, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let update = json!({"sale_price": "100000000.00"});
    let response = app
        .send(request(
            Method::PATCH,
            "/api/admin/products/1",
            Some(&update),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_order_status_rejected() {
    let app = TestApp::offline();
    let cookie = app.admin_cookie(AdminRole::Admin).await;
    let body = json!({"status": "lost"});
    let response = app
        .send(request(
            Method::PATCH,
            "/api/admin/orders/1/status",
            Some(&body),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_requires_login() {
    let app = TestApp::offline();
    let response = app
        .send(request(Method::POST, "/api/uploads/images", None, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_unavailable_without_storage() {
    let app = TestApp::offline();
    let cookie = app.customer_cookie(3, "maker").await;
    let response = app
        .send(request(
            Method::POST,
            "/api/uploads/images",
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = TestApp::offline();
    // Empty bodies fail validation without touching the database, but still
    // spend rate limiter tokens.
    let body = json!({});

    for _ in 0..5 {
        let response = app.send(post_json("/api/auth/login", &body, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app.send(post_json("/api/auth/login", &body, None)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_is_per_route_group() {
    let app = TestApp::offline();
    let body = json!({});
    for _ in 0..6 {
        app.send(post_json("/api/auth/login", &body, None)).await;
    }

    // Public routes are not limited.
    let response = app.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
