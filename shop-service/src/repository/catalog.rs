use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::Result;
use crate::models::*;
use crate::schema::*;

pub async fn create_category(conn: &mut AsyncPgConnection, new_category: &NewCategory) -> Result<Category> {
    let category = diesel::insert_into(categories::table)
        .values(new_category)
        .returning(Category::as_returning())
        .get_result(conn)
        .await?;
    Ok(category)
}

pub async fn find_category(conn: &mut AsyncPgConnection, id: i32) -> Result<Option<Category>> {
    let category = categories::table
        .filter(categories::id.eq(id))
        .filter(categories::deleted_at.is_null())
        .select(Category::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(category)
}

pub async fn list_active_categories(conn: &mut AsyncPgConnection) -> Result<Vec<Category>> {
    let rows = categories::table
        .filter(categories::is_active.eq(true))
        .filter(categories::deleted_at.is_null())
        .order(categories::id.asc())
        .select(Category::as_select())
        .load(conn)
        .await?;
    Ok(rows)
}

pub async fn update_category(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: &CategoryChangeset,
) -> Result<Option<Category>> {
    let category = diesel::update(
        categories::table
            .filter(categories::id.eq(id))
            .filter(categories::deleted_at.is_null()),
    )
    .set(changes)
    .returning(Category::as_returning())
    .get_result(conn)
    .await
    .optional()?;
    Ok(category)
}

/// Marks the category deleted; returns whether a live row was hit.
pub async fn soft_delete_category(conn: &mut AsyncPgConnection, id: i32) -> Result<bool> {
    let affected = diesel::update(
        categories::table
            .filter(categories::id.eq(id))
            .filter(categories::deleted_at.is_null()),
    )
    .set(categories::deleted_at.eq(Some(Utc::now())))
    .execute(conn)
    .await?;
    Ok(affected > 0)
}

pub async fn create_product(conn: &mut AsyncPgConnection, new_product: &NewProduct) -> Result<Product> {
    let product = diesel::insert_into(products::table)
        .values(new_product)
        .returning(Product::as_returning())
        .get_result(conn)
        .await?;
    Ok(product)
}

pub async fn find_product(conn: &mut AsyncPgConnection, id: i32) -> Result<Option<Product>> {
    let product = products::table
        .filter(products::id.eq(id))
        .filter(products::deleted_at.is_null())
        .select(Product::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(product)
}

/// Like `find_product`, holding a row lock until the transaction ends.
pub async fn lock_product(conn: &mut AsyncPgConnection, id: i32) -> Result<Option<Product>> {
    let product = products::table
        .filter(products::id.eq(id))
        .filter(products::deleted_at.is_null())
        .select(Product::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok(product)
}

pub async fn find_product_detail(conn: &mut AsyncPgConnection, id: i32) -> Result<Option<ProductDetail>> {
    let row = products::table
        .inner_join(categories::table)
        .filter(products::id.eq(id))
        .filter(products::deleted_at.is_null())
        .select((Product::as_select(), Category::as_select()))
        .first::<(Product, Category)>(conn)
        .await
        .optional()?;

    match row {
        Some(row) => Ok(with_images(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn list_active_products(
    conn: &mut AsyncPgConnection,
    offset: i64,
    limit: i64,
) -> Result<Vec<ProductDetail>> {
    let rows = products::table
        .inner_join(categories::table)
        .filter(products::is_active.eq(true))
        .filter(products::deleted_at.is_null())
        .order(products::id.asc())
        .offset(offset)
        .limit(limit)
        .select((Product::as_select(), Category::as_select()))
        .load::<(Product, Category)>(conn)
        .await?;

    with_images(conn, rows).await
}

pub async fn count_active_products(conn: &mut AsyncPgConnection) -> Result<i64> {
    let total = products::table
        .filter(products::is_active.eq(true))
        .filter(products::deleted_at.is_null())
        .count()
        .get_result(conn)
        .await?;
    Ok(total)
}

pub async fn update_product(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: &ProductChangeset,
) -> Result<Option<Product>> {
    let product = diesel::update(
        products::table
            .filter(products::id.eq(id))
            .filter(products::deleted_at.is_null()),
    )
    .set(changes)
    .returning(Product::as_returning())
    .get_result(conn)
    .await
    .optional()?;
    Ok(product)
}

pub async fn soft_delete_product(conn: &mut AsyncPgConnection, id: i32) -> Result<bool> {
    let affected = diesel::update(
        products::table
            .filter(products::id.eq(id))
            .filter(products::deleted_at.is_null()),
    )
    .set(products::deleted_at.eq(Some(Utc::now())))
    .execute(conn)
    .await?;
    Ok(affected > 0)
}

pub async fn count_product_images(conn: &mut AsyncPgConnection, product_id: i32) -> Result<i64> {
    let total = product_images::table
        .filter(product_images::product_id.eq(product_id))
        .count()
        .get_result(conn)
        .await?;
    Ok(total)
}

pub async fn create_product_image(conn: &mut AsyncPgConnection, image: &NewProductImage) -> Result<ProductImage> {
    let image = diesel::insert_into(product_images::table)
        .values(image)
        .returning(ProductImage::as_returning())
        .get_result(conn)
        .await?;
    Ok(image)
}

/// Loads the images of every product in one query and pairs them back up,
/// keeping the input order.
pub(crate) async fn with_images(
    conn: &mut AsyncPgConnection,
    rows: Vec<(Product, Category)>,
) -> Result<Vec<ProductDetail>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let (products, categories): (Vec<Product>, Vec<Category>) = rows.into_iter().unzip();

    let images = ProductImage::belonging_to(&products)
        .order(product_images::id.asc())
        .select(ProductImage::as_select())
        .load::<ProductImage>(conn)
        .await?;
    let images = images.grouped_by(&products);

    Ok(products
        .into_iter()
        .zip(categories)
        .zip(images)
        .map(|((product, category), images)| ProductDetail {
            product,
            category,
            images,
        })
        .collect())
}
