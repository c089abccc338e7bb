use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::Result;
use crate::models::*;
use crate::repository::catalog::with_images;
use crate::schema::*;

/// Row-locks the given products in ascending id order so that concurrent
/// checkouts over overlapping products always acquire locks the same way.
/// Soft-deleted and inactive products are included; the caller decides.
pub async fn lock_products(conn: &mut AsyncPgConnection, mut product_ids: Vec<i32>) -> Result<Vec<Product>> {
    product_ids.sort_unstable();
    product_ids.dedup();

    let rows = products::table
        .filter(products::id.eq_any(product_ids))
        .order(products::id.asc())
        .select(Product::as_select())
        .for_update()
        .load(conn)
        .await?;
    Ok(rows)
}

/// Conditional decrement. Returns `false` when the row no longer has enough
/// stock, leaving it unchanged.
pub async fn decrement_stock(conn: &mut AsyncPgConnection, product_id: i32, quantity: i32) -> Result<bool> {
    let affected = diesel::update(
        products::table
            .filter(products::id.eq(product_id))
            .filter(products::stock.ge(quantity)),
    )
    .set((
        products::stock.eq(products::stock - quantity),
        products::updated_at.eq(Utc::now()),
    ))
    .execute(conn)
    .await?;
    Ok(affected == 1)
}

pub async fn insert_order(conn: &mut AsyncPgConnection, new_order: &NewOrder) -> Result<Order> {
    let order = diesel::insert_into(orders::table)
        .values(new_order)
        .returning(Order::as_returning())
        .get_result(conn)
        .await?;
    Ok(order)
}

pub async fn insert_order_items(conn: &mut AsyncPgConnection, items: &[NewOrderItem]) -> Result<usize> {
    let inserted = diesel::insert_into(order_items::table)
        .values(items)
        .execute(conn)
        .await?;
    Ok(inserted)
}

/// Ownership is part of the predicate, so a foreign order reads as missing.
pub async fn find_order_for_user(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    order_id: i32,
) -> Result<Option<Order>> {
    let order = orders::table
        .filter(orders::id.eq(order_id))
        .filter(orders::user_id.eq(user_id))
        .filter(orders::deleted_at.is_null())
        .select(Order::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(order)
}

/// Newest first; ties on `created_at` broken by id.
pub async fn list_orders(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    offset: i64,
    limit: i64,
) -> Result<Vec<Order>> {
    let rows = orders::table
        .filter(orders::user_id.eq(user_id))
        .filter(orders::deleted_at.is_null())
        .order((orders::created_at.desc(), orders::id.desc()))
        .offset(offset)
        .limit(limit)
        .select(Order::as_select())
        .load(conn)
        .await?;
    Ok(rows)
}

pub async fn count_orders(conn: &mut AsyncPgConnection, user_id: i32) -> Result<i64> {
    let total = orders::table
        .filter(orders::user_id.eq(user_id))
        .filter(orders::deleted_at.is_null())
        .count()
        .get_result(conn)
        .await?;
    Ok(total)
}

/// Attaches items, products, categories and images to each order. Products
/// are loaded without the soft-delete filter so history stays readable.
pub async fn with_lines(conn: &mut AsyncPgConnection, orders: Vec<Order>) -> Result<Vec<OrderDetail>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let rows = order_items::table
        .inner_join(products::table.inner_join(categories::table))
        .filter(order_items::order_id.eq_any(order_ids))
        .order(order_items::id.asc())
        .select((OrderItem::as_select(), Product::as_select(), Category::as_select()))
        .load::<(OrderItem, Product, Category)>(conn)
        .await?;

    let (items, products): (Vec<OrderItem>, Vec<(Product, Category)>) = rows
        .into_iter()
        .map(|(item, product, category)| (item, (product, category)))
        .unzip();
    let details = with_images(conn, products).await?;

    let mut by_order: HashMap<i32, Vec<OrderLine>> = HashMap::new();
    for (item, product) in items.into_iter().zip(details) {
        by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderLine { item, product });
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let lines = by_order.remove(&order.id).unwrap_or_default();
            OrderDetail { order, lines }
        })
        .collect())
}

pub async fn find_order_detail(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    order_id: i32,
) -> Result<Option<OrderDetail>> {
    let Some(order) = find_order_for_user(conn, user_id, order_id).await? else {
        return Ok(None);
    };
    Ok(with_lines(conn, vec![order]).await?.pop())
}
