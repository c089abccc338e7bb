use std::time::Duration;

use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use shared::{OrderResponse, OrderStatus, PaginationMeta};
use tracing::{info, instrument, warn};

use crate::checkout::plan_order;
use crate::error::{Result, ShopError};
use crate::models::{NewOrder, NewOrderItem, OrderDetail};
use crate::pagination::Page;
use crate::repository::{carts, orders};
use crate::DbPool;

#[derive(Clone)]
pub struct OrderService {
    pool: DbPool,
    checkout_timeout: Duration,
}

impl OrderService {
    pub fn new(pool: DbPool, checkout_timeout: Duration) -> Self {
        Self { pool, checkout_timeout }
    }

    /// Converts the user's cart into an order in one transaction. On any
    /// failure, including the deadline passing, nothing is committed.
    #[instrument(skip(self))]
    pub async fn place_order(&self, user_id: i32) -> Result<OrderResponse> {
        let attempt = async {
            let mut conn = self.pool.get().await?;
            checkout(&mut conn, user_id).await
        };

        let detail = match tokio::time::timeout(self.checkout_timeout, attempt).await {
            Ok(result) => result?,
            Err(elapsed) => {
                warn!(timeout_ms = self.checkout_timeout.as_millis() as u64, "Checkout deadline exceeded");
                return Err(elapsed.into());
            }
        };

        info!(
            order_id = detail.order.id,
            total = %detail.order.total_amount,
            items = detail.lines.len(),
            "Placed order"
        );
        Ok(detail.into())
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, user_id: i32, order_id: i32) -> Result<OrderResponse> {
        let mut conn = self.pool.get().await?;
        let detail = orders::find_order_detail(&mut conn, user_id, order_id)
            .await?
            .ok_or(ShopError::NotFound("order"))?;
        Ok(detail.into())
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: i32, page: Page) -> Result<(Vec<OrderResponse>, PaginationMeta)> {
        let mut conn = self.pool.get().await?;
        let rows = orders::list_orders(&mut conn, user_id, page.offset(), page.limit).await?;
        let total = orders::count_orders(&mut conn, user_id).await?;
        let details = orders::with_lines(&mut conn, rows).await?;
        Ok((details.into_iter().map(Into::into).collect(), page.meta(total)))
    }
}

async fn checkout(conn: &mut AsyncPgConnection, user_id: i32) -> Result<OrderDetail> {
    conn.transaction::<_, ShopError, _>(|conn| {
        async move {
            let cart = carts::find_cart_detail(conn, user_id)
                .await?
                .ok_or(ShopError::NotFound("cart"))?;
            if cart.lines.is_empty() {
                return Err(ShopError::EmptyCart);
            }

            let product_ids = cart.lines.iter().map(|l| l.item.product_id).collect();
            let locked = orders::lock_products(conn, product_ids).await?;
            let plan = plan_order(&cart, &locked)?;

            for item in &plan.items {
                if !orders::decrement_stock(conn, item.product_id, item.quantity).await? {
                    let product = locked
                        .iter()
                        .find(|p| p.id == item.product_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_default();
                    return Err(ShopError::InsufficientStock { product });
                }
            }

            let order = orders::insert_order(
                conn,
                &NewOrder {
                    user_id,
                    status: OrderStatus::Pending.as_str().to_string(),
                    total_amount: plan.total.clone(),
                },
            )
            .await?;

            let items: Vec<NewOrderItem> = plan
                .items
                .into_iter()
                .map(|item| NewOrderItem {
                    order_id: order.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect();
            orders::insert_order_items(conn, &items).await?;

            carts::clear_items(conn, cart.cart.id).await?;

            orders::with_lines(conn, vec![order])
                .await?
                .pop()
                .ok_or(ShopError::NotFound("order"))
        }
        .scope_boxed()
    })
    .await
}
