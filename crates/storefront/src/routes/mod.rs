//! HTTP routes for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness
//! GET    /health/ready                         - Readiness (database)
//!
//! # Customer auth (register and login are rate limited)
//! POST   /api/auth/register
//! POST   /api/auth/login
//! POST   /api/auth/logout
//! GET    /api/auth/me
//! PATCH  /api/account
//!
//! # Catalog
//! GET    /api/categories
//! GET    /api/categories/{slug}
//! GET    /api/products
//! GET    /api/products/{slug}
//!
//! # Cart (customer or anonymous session)
//! GET    /api/cart
//! DELETE /api/cart
//! POST   /api/cart/items
//! PATCH  /api/cart/items/{item_id}
//! DELETE /api/cart/items/{item_id}?quantity=n
//!
//! # Orders
//! POST   /api/orders                           - Checkout
//! GET    /api/orders
//! GET    /api/orders/{order_number}
//! POST   /api/orders/{order_number}/cancel
//! GET    /api/orders/{order_number}/messages
//! POST   /api/orders/{order_number}/messages
//!
//! # Other
//! GET    /api/favorites
//! POST   /api/favorites
//! DELETE /api/favorites/{product_id}
//! POST   /api/contact
//! GET    /api/tracking/{tracking_number}
//! POST   /api/uploads/images
//!
//! # Back office (see `admin`)
//! /api/admin/...
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod tracking;
pub mod uploads;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, Response},
    middleware::from_fn,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::{auth_rate_limiter, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Room for multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the customer auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{slug}", get(catalog::show_category))
        .route("/products", get(catalog::list_products))
        .route("/products/{slug}", get(catalog::show_product))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{item_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::checkout))
        .route("/{order_number}", get(orders::show))
        .route("/{order_number}/cancel", post(orders::cancel))
        .route(
            "/{order_number}/messages",
            get(orders::list_messages).post(orders::post_message),
        )
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::list).post(favorites::add))
        .route("/{product_id}", delete(favorites::remove))
}

/// Create the back-office routes router.
pub fn admin_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/auth/login", post(admin::auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/auth/logout", post(admin::auth::logout))
        .route("/auth/me", get(admin::auth::me))
        // Catalog
        .route(
            "/products",
            get(admin::catalog::list_products).post(admin::catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(admin::catalog::show_product)
                .patch(admin::catalog::update_product)
                .delete(admin::catalog::delete_product),
        )
        .route(
            "/categories",
            get(admin::catalog::list_categories).post(admin::catalog::create_category),
        )
        .route(
            "/categories/{id}",
            patch(admin::catalog::update_category).delete(admin::catalog::delete_category),
        )
        // Inventory
        .route("/inventory", get(admin::inventory::list))
        .route(
            "/inventory/{product_id}",
            get(admin::inventory::show).put(admin::inventory::set),
        )
        .route(
            "/inventory/{product_id}/adjust",
            post(admin::inventory::adjust),
        )
        // Orders and shipping
        .route("/orders", get(admin::orders::list))
        .route("/orders/{id}", get(admin::orders::show))
        .route("/orders/{id}/status", patch(admin::orders::update_status))
        .route(
            "/orders/{id}/messages",
            get(admin::orders::list_messages).post(admin::orders::post_message),
        )
        .route(
            "/shipping/{tracking_number}/events",
            post(admin::orders::add_tracking_event),
        )
        // Inbox and accounts
        .route("/contact", get(admin::contact::list))
        .route("/contact/{id}", delete(admin::contact::delete))
        .route("/users", get(admin::users::list_users))
        .route(
            "/admins",
            get(admin::users::list_admins).post(admin::users::create_admin),
        )
}

/// Create all routes for the storefront.
///
/// `max_upload_bytes` sizes the body limit of the image upload route.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .route("/account", patch(account::update))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/favorites", favorite_routes())
        .route("/contact", post(contact::submit))
        .route("/tracking/{tracking_number}", get(tracking::show))
        .route(
            "/uploads/images",
            post(uploads::upload_image)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .nest("/admin", admin_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}

/// Build the application: routes plus the session, security header,
/// request id and trace layers.
///
/// Sentry layers are added by the binary on top of this.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let max_upload_bytes = state
        .config()
        .storage
        .as_ref()
        .map_or(0, |storage| storage.max_upload_bytes);

    routes(max_upload_bytes)
        .layer(sessions)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                        request_id = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    tracing::debug!("response sent");
                }),
        )
        .with_state(state)
}
