use diesel_async::AsyncPgConnection;
use shared::{AddToCartRequest, CartResponse, UpdateCartItemRequest};
use tracing::{debug, instrument};

use crate::error::{Result, ShopError};
use crate::models::{CartDetail, NewCartItem};
use crate::repository::{carts, catalog};
use crate::DbPool;

#[derive(Clone)]
pub struct CartService {
    pool: DbPool,
}

impl CartService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: i32) -> Result<CartResponse> {
        let mut conn = self.pool.get().await?;
        load_cart(&mut conn, user_id).await
    }

    /// Adds the product, summing with any quantity already in the cart.
    #[instrument(skip(self, request), fields(product_id = request.product_id, quantity = request.quantity))]
    pub async fn add_to_cart(&self, user_id: i32, request: AddToCartRequest) -> Result<CartResponse> {
        require_positive(request.quantity)?;

        let mut conn = self.pool.get().await?;
        let product = catalog::find_product(&mut conn, request.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(ShopError::NotFound("product"))?;

        let cart = carts::get_or_create_cart(&mut conn, user_id).await?;

        match carts::find_item(&mut conn, cart.id, product.id).await? {
            Some(item) => {
                let quantity = item
                    .quantity
                    .checked_add(request.quantity)
                    .ok_or_else(|| ShopError::validation("quantity is too large"))?;
                if product.stock < quantity {
                    return Err(ShopError::InsufficientStock { product: product.name });
                }
                carts::set_item_quantity(&mut conn, item.id, quantity).await?;
                debug!(item_id = item.id, quantity, "Increased cart item quantity");
            }
            None => {
                if product.stock < request.quantity {
                    return Err(ShopError::InsufficientStock { product: product.name });
                }
                let item = carts::create_item(
                    &mut conn,
                    &NewCartItem {
                        cart_id: cart.id,
                        product_id: product.id,
                        quantity: request.quantity,
                    },
                )
                .await?;
                debug!(item_id = item.id, "Added cart item");
            }
        }

        load_cart(&mut conn, user_id).await
    }

    /// Sets the item's quantity to the given absolute value.
    #[instrument(skip(self, request), fields(quantity = request.quantity))]
    pub async fn update_cart_item(
        &self,
        user_id: i32,
        item_id: i32,
        request: UpdateCartItemRequest,
    ) -> Result<CartResponse> {
        require_positive(request.quantity)?;

        let mut conn = self.pool.get().await?;
        let item = carts::find_item_for_user(&mut conn, user_id, item_id)
            .await?
            .ok_or(ShopError::NotFound("cart item"))?;

        let product = catalog::find_product(&mut conn, item.product_id)
            .await?
            .ok_or(ShopError::NotFound("product"))?;
        if product.stock < request.quantity {
            return Err(ShopError::InsufficientStock { product: product.name });
        }

        carts::set_item_quantity(&mut conn, item.id, request.quantity).await?;
        load_cart(&mut conn, user_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, user_id: i32, item_id: i32) -> Result<()> {
        let mut conn = self.pool.get().await?;
        if carts::delete_item_for_user(&mut conn, user_id, item_id).await? == 0 {
            return Err(ShopError::NotFound("cart item"));
        }
        Ok(())
    }
}

async fn load_cart(conn: &mut AsyncPgConnection, user_id: i32) -> Result<CartResponse> {
    let cart = carts::get_or_create_cart(conn, user_id).await?;
    let lines = carts::load_lines(conn, cart.id).await?;
    Ok(CartDetail { cart, lines }.into())
}

fn require_positive(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(ShopError::validation("quantity must be at least 1"));
    }
    Ok(())
}
