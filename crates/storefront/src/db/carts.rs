//! Cart repository.
//!
//! A cart belongs to either a user or an anonymous session token. Line
//! quantity rules live in [`aurelia_core::cart`]; this module only applies
//! the resulting [`LineChange`].

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use aurelia_core::cart::{LineChange, Quantity, merge_lines};
use aurelia_core::pricing::unit_price;
use aurelia_core::{CartId, CartItemId, Money, ProductId, Sku, Slug, UserId};

use super::{RepositoryError, to_u32};
use crate::models::{CartLine, CartOwner};

const LINE_SELECT: &str = "
    SELECT ci.id, ci.product_id, p.sku, p.name, p.slug, p.images[1] AS image,
           p.price, p.sale_price, ci.quantity, p.in_stock
    FROM shop.cart_items ci
    JOIN shop.products p ON p.id = ci.product_id";

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    product_id: i32,
    sku: String,
    name: String,
    slug: String,
    image: Option<String>,
    price: Decimal,
    sale_price: Option<Decimal>,
    quantity: i32,
    in_stock: bool,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let price = Money::new(row.price).map_err(|e| RepositoryError::corrupt("price", e))?;
        let sale_price = row
            .sale_price
            .map(Money::new)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("sale price", e))?;
        let unit = unit_price(price, sale_price);
        let quantity = to_u32(row.quantity, "cart quantity")?;

        Ok(Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            sku: Sku::parse(&row.sku).map_err(|e| RepositoryError::corrupt("sku", e))?,
            name: row.name,
            slug: Slug::parse(&row.slug).map_err(|e| RepositoryError::corrupt("slug", e))?,
            image: row.image,
            unit_price: unit,
            quantity,
            line_total: unit * quantity,
            in_stock: row.in_stock,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineQuantityRow {
    product_id: i32,
    quantity: i32,
}

impl TryFrom<LineQuantityRow> for (ProductId, Quantity) {
    type Error = RepositoryError;

    fn try_from(row: LineQuantityRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(to_u32(row.quantity, "cart quantity")?)
            .map_err(|e| RepositoryError::corrupt("cart quantity", e))?;
        Ok((ProductId::new(row.product_id), quantity))
    }
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the owner's cart without creating one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, owner: CartOwner) -> Result<Option<CartId>, RepositoryError> {
        let id: Option<i32> = match owner {
            CartOwner::User(user_id) => {
                sqlx::query_scalar("SELECT id FROM shop.carts WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(self.pool)
                    .await?
            }
            CartOwner::Guest(token) => {
                sqlx::query_scalar("SELECT id FROM shop.carts WHERE token = $1")
                    .bind(token)
                    .fetch_optional(self.pool)
                    .await?
            }
        };
        Ok(id.map(CartId::new))
    }

    /// Get the owner's cart, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, owner: CartOwner) -> Result<CartId, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        upsert_cart(&mut conn, owner).await
    }

    /// Lines of a cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "{LINE_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.added_at, ci.id"
        ))
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Current quantity of a product in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_quantity(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<Quantity>, RepositoryError> {
        let row = sqlx::query_as::<_, LineQuantityRow>(
            "SELECT product_id, quantity FROM shop.cart_items
             WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row
            .map(<(ProductId, Quantity)>::try_from)
            .transpose()?
            .map(|(_, q)| q))
    }

    /// Product and quantity of a cart line, scoped to the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<(ProductId, Quantity)>, RepositoryError> {
        let row = sqlx::query_as::<_, LineQuantityRow>(
            "SELECT product_id, quantity FROM shop.cart_items
             WHERE cart_id = $1 AND id = $2",
        )
        .bind(cart_id)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(<(ProductId, Quantity)>::try_from).transpose()
    }

    /// Set the quantity of the line for `product_id`, inserting it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_product_quantity(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        upsert_line(&mut conn, cart_id, product_id, quantity).await?;
        touch(&mut conn, cart_id).await
    }

    /// Apply a change to an existing cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn apply_to_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        change: LineChange,
    ) -> Result<(), RepositoryError> {
        let result = match change {
            LineChange::Keep(quantity) => {
                sqlx::query(
                    "UPDATE shop.cart_items SET quantity = $3
                     WHERE cart_id = $1 AND id = $2",
                )
                .bind(cart_id)
                .bind(item_id)
                .bind(quantity_param(quantity))
                .execute(self.pool)
                .await?
            }
            LineChange::Delete => {
                sqlx::query("DELETE FROM shop.cart_items WHERE cart_id = $1 AND id = $2")
                    .bind(cart_id)
                    .bind(item_id)
                    .execute(self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        let mut conn = self.pool.acquire().await?;
        touch(&mut conn, cart_id).await
    }

    /// Remove every line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        clear_lines(&mut conn, cart_id).await
    }

    /// Move an anonymous cart into a user's cart, summing shared products.
    ///
    /// The anonymous cart is deleted afterwards. Does nothing when the token
    /// has no cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn merge_guest_cart(&self, token: Uuid, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let guest_id: Option<i32> =
            sqlx::query_scalar("SELECT id FROM shop.carts WHERE token = $1 FOR UPDATE")
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(guest_id) = guest_id.map(CartId::new) else {
            return Ok(());
        };

        let user_cart = upsert_cart(&mut tx, CartOwner::User(user_id)).await?;
        let user_lines = line_quantities(&mut tx, user_cart).await?;
        let guest_lines = line_quantities(&mut tx, guest_id).await?;

        for (product_id, quantity) in merge_lines(&user_lines, &guest_lines) {
            upsert_line(&mut tx, user_cart, product_id, quantity).await?;
        }

        sqlx::query("DELETE FROM shop.carts WHERE id = $1")
            .bind(guest_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            merged_lines = guest_lines.len(),
            "Merged guest cart"
        );
        Ok(())
    }
}

fn quantity_param(quantity: Quantity) -> i32 {
    // Quantity is capped well below i32::MAX.
    i32::try_from(quantity.get()).unwrap_or(i32::MAX)
}

async fn upsert_cart(conn: &mut PgConnection, owner: CartOwner) -> Result<CartId, RepositoryError> {
    let id: i32 = match owner {
        CartOwner::User(user_id) => {
            sqlx::query_scalar(
                "INSERT INTO shop.carts (user_id) VALUES ($1)
                 ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
                 RETURNING id",
            )
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?
        }
        CartOwner::Guest(token) => {
            sqlx::query_scalar(
                "INSERT INTO shop.carts (token) VALUES ($1)
                 ON CONFLICT (token) DO UPDATE SET updated_at = NOW()
                 RETURNING id",
            )
            .bind(token)
            .fetch_one(&mut *conn)
            .await?
        }
    };
    Ok(CartId::new(id))
}

async fn upsert_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    quantity: Quantity,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.cart_items (cart_id, product_id, quantity)
         VALUES ($1, $2, $3)
         ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity_param(quantity))
    .execute(&mut *conn)
    .await
    .map_err(|e| RepositoryError::unique_or_missing(e, "cart line"))?;
    Ok(())
}

async fn line_quantities(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<(ProductId, Quantity)>, RepositoryError> {
    let rows = sqlx::query_as::<_, LineQuantityRow>(
        "SELECT product_id, quantity FROM shop.cart_items WHERE cart_id = $1",
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(TryFrom::try_from).collect()
}

async fn touch(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Lock and load a cart's lines inside a checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(&format!(
        "{LINE_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.added_at, ci.id FOR UPDATE OF ci"
    ))
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(CartLine::try_from).collect()
}

/// Delete all lines of a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_lines(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    touch(conn, cart_id).await
}
