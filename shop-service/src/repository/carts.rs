use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::Result;
use crate::models::*;
use crate::repository::catalog::with_images;
use crate::schema::*;

pub async fn create_cart(conn: &mut AsyncPgConnection, user_id: i32) -> Result<Cart> {
    let cart = diesel::insert_into(carts::table)
        .values(&NewCart { user_id })
        .returning(Cart::as_returning())
        .get_result(conn)
        .await?;
    Ok(cart)
}

pub async fn find_cart_by_user(conn: &mut AsyncPgConnection, user_id: i32) -> Result<Option<Cart>> {
    let cart = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(cart)
}

/// Returns the user's cart, creating it on first access. Safe against a
/// concurrent first access thanks to the unique `user_id`.
pub async fn get_or_create_cart(conn: &mut AsyncPgConnection, user_id: i32) -> Result<Cart> {
    if let Some(cart) = find_cart_by_user(conn, user_id).await? {
        return Ok(cart);
    }

    diesel::insert_into(carts::table)
        .values(&NewCart { user_id })
        .on_conflict(carts::user_id)
        .do_nothing()
        .execute(conn)
        .await?;

    let cart = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .first(conn)
        .await?;
    Ok(cart)
}

pub async fn find_item(conn: &mut AsyncPgConnection, cart_id: i32, product_id: i32) -> Result<Option<CartItem>> {
    let item = cart_items::table
        .filter(cart_items::cart_id.eq(cart_id))
        .filter(cart_items::product_id.eq(product_id))
        .select(CartItem::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(item)
}

pub async fn create_item(conn: &mut AsyncPgConnection, new_item: &NewCartItem) -> Result<CartItem> {
    let item = diesel::insert_into(cart_items::table)
        .values(new_item)
        .returning(CartItem::as_returning())
        .get_result(conn)
        .await?;
    Ok(item)
}

pub async fn set_item_quantity(conn: &mut AsyncPgConnection, item_id: i32, quantity: i32) -> Result<CartItem> {
    let item = diesel::update(cart_items::table.filter(cart_items::id.eq(item_id)))
        .set((
            cart_items::quantity.eq(quantity),
            cart_items::updated_at.eq(Utc::now()),
        ))
        .returning(CartItem::as_returning())
        .get_result(conn)
        .await?;
    Ok(item)
}

/// Item lookup with ownership in the join predicate.
pub async fn find_item_for_user(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    item_id: i32,
) -> Result<Option<CartItem>> {
    let item = cart_items::table
        .inner_join(carts::table)
        .filter(cart_items::id.eq(item_id))
        .filter(carts::user_id.eq(user_id))
        .select(CartItem::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(item)
}

/// Hard delete restricted to the user's own cart.
pub async fn delete_item_for_user(conn: &mut AsyncPgConnection, user_id: i32, item_id: i32) -> Result<usize> {
    let owned_carts = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(carts::id);

    let deleted = diesel::delete(
        cart_items::table
            .filter(cart_items::id.eq(item_id))
            .filter(cart_items::cart_id.eq_any(owned_carts)),
    )
    .execute(conn)
    .await?;
    Ok(deleted)
}

/// Purges every item of the cart. The cart row itself stays.
pub async fn clear_items(conn: &mut AsyncPgConnection, cart_id: i32) -> Result<usize> {
    let deleted = diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
        .execute(conn)
        .await?;
    Ok(deleted)
}

/// Cart items in insertion order, each with its product, category and images.
/// Lines whose product has been soft-deleted are left out.
pub async fn load_lines(conn: &mut AsyncPgConnection, cart_id: i32) -> Result<Vec<CartLine>> {
    fetch_lines(conn, cart_id, false).await
}

/// The user's cart with every line, including those whose product has since
/// been soft-deleted, so that checkout can refuse them. `None` when the user
/// has no cart row.
pub async fn find_cart_detail(conn: &mut AsyncPgConnection, user_id: i32) -> Result<Option<CartDetail>> {
    let Some(cart) = find_cart_by_user(conn, user_id).await? else {
        return Ok(None);
    };
    let lines = fetch_lines(conn, cart.id, true).await?;
    Ok(Some(CartDetail { cart, lines }))
}

async fn fetch_lines(conn: &mut AsyncPgConnection, cart_id: i32, include_deleted: bool) -> Result<Vec<CartLine>> {
    let mut query = cart_items::table
        .inner_join(products::table.inner_join(categories::table))
        .filter(cart_items::cart_id.eq(cart_id))
        .select((CartItem::as_select(), Product::as_select(), Category::as_select()))
        .into_boxed();
    if !include_deleted {
        query = query.filter(products::deleted_at.is_null());
    }

    let rows = query
        .order(cart_items::id.asc())
        .load::<(CartItem, Product, Category)>(conn)
        .await?;

    let (items, products): (Vec<CartItem>, Vec<(Product, Category)>) = rows
        .into_iter()
        .map(|(item, product, category)| (item, (product, category)))
        .unzip();
    let details = with_images(conn, products).await?;

    Ok(items
        .into_iter()
        .zip(details)
        .map(|(item, product)| CartLine { item, product })
        .collect())
}
