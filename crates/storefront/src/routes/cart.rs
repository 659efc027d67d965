//! Cart route handlers.
//!
//! Logged-in customers use their own cart. Anyone else gets an anonymous cart
//! keyed by a token kept in the session, created on the first add. The token
//! is folded into the customer's cart at login.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use aurelia_core::cart::{LineChange, Quantity, add_quantity, remove_quantity, set_quantity};
use aurelia_core::{CartItemId, ProductId, UserId};

use crate::db::{CartRepository, InventoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::OptionalUser;
use crate::models::session::keys;
use crate::models::{CartOwner, CartView, CurrentUser};
use crate::state::AppState;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `PATCH /api/cart/items/{item_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Query of `DELETE /api/cart/items/{item_id}`.
#[derive(Debug, Deserialize)]
pub struct RemoveItemQuery {
    pub quantity: Option<u32>,
}

/// The cart owner for this request, if the visitor has a cart yet.
pub(crate) async fn cart_owner(
    session: &Session,
    user: Option<&CurrentUser>,
) -> Result<Option<CartOwner>> {
    if let Some(user) = user {
        return Ok(Some(CartOwner::User(user.id)));
    }
    let token = session.get::<Uuid>(keys::CART_TOKEN).await?;
    Ok(token.map(CartOwner::Guest))
}

/// Like [`cart_owner`], but gives a guest a fresh cart token if needed.
async fn cart_owner_or_create(session: &Session, user: Option<&CurrentUser>) -> Result<CartOwner> {
    if let Some(owner) = cart_owner(session, user).await? {
        return Ok(owner);
    }
    let token = Uuid::new_v4();
    session.insert(keys::CART_TOKEN, token).await?;
    Ok(CartOwner::Guest(token))
}

/// Move the session's anonymous cart into the user's cart.
pub(crate) async fn adopt_guest_cart(
    state: &AppState,
    session: &Session,
    user_id: UserId,
) -> Result<()> {
    if let Some(token) = session.remove::<Uuid>(keys::CART_TOKEN).await? {
        CartRepository::new(state.pool())
            .merge_guest_cart(token, user_id)
            .await?;
    }
    Ok(())
}

async fn cart_view(state: &AppState, owner: Option<CartOwner>) -> Result<CartView> {
    let policy = &state.config().shipping;
    let Some(owner) = owner else {
        return Ok(CartView::empty(policy));
    };
    let repo = CartRepository::new(state.pool());
    let Some(cart_id) = repo.find(owner).await? else {
        return Ok(CartView::empty(policy));
    };
    Ok(CartView::new(repo.lines(cart_id).await?, policy))
}

/// Fail unless stock on hand covers `quantity` of the product.
async fn ensure_stock(state: &AppState, product_id: ProductId, quantity: Quantity) -> Result<()> {
    let record = InventoryRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Product is out of stock".to_string()))?;
    let level = record.level();
    if level.can_fulfil(quantity.get()) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Only {} of {} in stock",
            level.quantity, record.name
        )))
    }
}

fn item_not_found() -> AppError {
    AppError::NotFound("Cart item not found".to_string())
}

/// `GET /api/cart`
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Json<CartView>> {
    let owner = cart_owner(&session, user.as_ref()).await?;
    Ok(Json(cart_view(&state, owner).await?))
}

/// Add a product, summing with any existing line.
///
/// `POST /api/cart/items`
#[instrument(skip(state, session, user))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<CartView>> {
    let added = Quantity::new(body.quantity)?;

    let product = ProductRepository::new(state.pool())
        .get_by_id(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if !product.in_stock {
        return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
    }

    let owner = cart_owner_or_create(&session, user.as_ref()).await?;
    let repo = CartRepository::new(state.pool());
    let cart_id = repo.get_or_create(owner).await?;

    let existing = repo.product_quantity(cart_id, product.id).await?;
    let quantity = add_quantity(existing, added)?;
    ensure_stock(&state, product.id, quantity).await?;

    repo.set_product_quantity(cart_id, product.id, quantity)
        .await?;
    tracing::debug!(product_id = %product.id, quantity = quantity.get(), "Cart line added");

    Ok(Json(cart_view(&state, Some(owner)).await?))
}

/// Set a line's quantity. Zero removes the line.
///
/// `PATCH /api/cart/items/{item_id}`
#[instrument(skip(state, session, user))]
pub async fn update_item(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    ApiPath(item_id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let change = set_quantity(body.quantity)?;
    let owner = cart_owner(&session, user.as_ref())
        .await?
        .ok_or_else(item_not_found)?;
    let repo = CartRepository::new(state.pool());
    let cart_id = repo.find(owner).await?.ok_or_else(item_not_found)?;
    let (product_id, _) = repo
        .item(cart_id, item_id)
        .await?
        .ok_or_else(item_not_found)?;

    if let LineChange::Keep(quantity) = change {
        ensure_stock(&state, product_id, quantity).await?;
    }
    repo.apply_to_item(cart_id, item_id, change).await?;

    Ok(Json(cart_view(&state, Some(owner)).await?))
}

/// Decrement a line, or remove it when no quantity is given.
///
/// `DELETE /api/cart/items/{item_id}?quantity=n`
#[instrument(skip(state, session, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    ApiPath(item_id): ApiPath<CartItemId>,
    ApiQuery(query): ApiQuery<RemoveItemQuery>,
) -> Result<Json<CartView>> {
    let owner = cart_owner(&session, user.as_ref())
        .await?
        .ok_or_else(item_not_found)?;
    let repo = CartRepository::new(state.pool());
    let cart_id = repo.find(owner).await?.ok_or_else(item_not_found)?;
    let (_, existing) = repo
        .item(cart_id, item_id)
        .await?
        .ok_or_else(item_not_found)?;

    repo.apply_to_item(cart_id, item_id, remove_quantity(existing, query.quantity))
        .await?;

    Ok(Json(cart_view(&state, Some(owner)).await?))
}

/// Remove every line.
///
/// `DELETE /api/cart`
#[instrument(skip(state, session, user))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Json<CartView>> {
    let owner = cart_owner(&session, user.as_ref()).await?;
    if let Some(owner) = owner {
        let repo = CartRepository::new(state.pool());
        if let Some(cart_id) = repo.find(owner).await? {
            repo.clear(cart_id).await?;
        }
    }
    Ok(Json(CartView::empty(&state.config().shipping)))
}
