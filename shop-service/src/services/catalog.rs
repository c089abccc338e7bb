use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::AsyncConnection;
use num_traits::Zero;
use shared::{
    CategoryResponse, CreateCategoryRequest, CreateProductRequest, PaginationMeta, ProductImageResponse,
    ProductResponse, UpdateCategoryRequest, UpdateProductRequest,
};
use tracing::{info, instrument, warn};

use crate::error::{Result, ShopError};
use crate::models::*;
use crate::pagination::Page;
use crate::repository::catalog;
use crate::upload::LocalUploadStore;
use crate::DbPool;

#[derive(Clone)]
pub struct CatalogService {
    pool: DbPool,
    uploads: LocalUploadStore,
}

impl CatalogService {
    pub fn new(pool: DbPool, uploads: LocalUploadStore) -> Self {
        Self { pool, uploads }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(&self, request: CreateCategoryRequest) -> Result<CategoryResponse> {
        require_name(&request.name)?;

        let mut conn = self.pool.get().await?;
        let category = catalog::create_category(
            &mut conn,
            &NewCategory {
                name: request.name,
                description: request.description,
            },
        )
        .await?;

        info!(category_id = category.id, "Created category");
        Ok(category.into())
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>> {
        let mut conn = self.pool.get().await?;
        let rows = catalog::list_active_categories(&mut conn).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_category(&self, id: i32) -> Result<CategoryResponse> {
        let mut conn = self.pool.get().await?;
        let category = catalog::find_category(&mut conn, id)
            .await?
            .ok_or(ShopError::NotFound("category"))?;
        Ok(category.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(&self, id: i32, request: UpdateCategoryRequest) -> Result<CategoryResponse> {
        require_name(&request.name)?;

        let changes = CategoryChangeset {
            name: request.name,
            description: request.description,
            is_active: request.is_active,
            updated_at: Utc::now(),
        };

        let mut conn = self.pool.get().await?;
        let category = catalog::update_category(&mut conn, id, &changes)
            .await?
            .ok_or(ShopError::NotFound("category"))?;
        Ok(category.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<()> {
        let mut conn = self.pool.get().await?;
        if !catalog::soft_delete_category(&mut conn, id).await? {
            return Err(ShopError::NotFound("category"));
        }
        info!("Deleted category");
        Ok(())
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(&self, request: CreateProductRequest) -> Result<ProductResponse> {
        require_name(&request.name)?;
        validate_price_and_stock(&request.price, request.stock)?;
        if request.sku.trim().is_empty() {
            return Err(ShopError::validation("sku is required"));
        }

        let mut conn = self.pool.get().await?;
        if catalog::find_category(&mut conn, request.category_id).await?.is_none() {
            return Err(ShopError::NotFound("category"));
        }

        let product = catalog::create_product(
            &mut conn,
            &NewProduct {
                category_id: request.category_id,
                name: request.name,
                description: request.description,
                price: request.price,
                stock: request.stock,
                sku: request.sku,
            },
        )
        .await
        .map_err(|e| match e {
            ShopError::Conflict(_) => ShopError::Conflict("a product with this sku already exists".to_string()),
            other => other,
        })?;

        info!(product_id = product.id, "Created product");
        self.product_detail(&mut conn, product.id).await
    }

    pub async fn get_product(&self, id: i32) -> Result<ProductResponse> {
        let mut conn = self.pool.get().await?;
        self.product_detail(&mut conn, id).await
    }

    pub async fn list_products(&self, page: Page) -> Result<(Vec<ProductResponse>, PaginationMeta)> {
        let mut conn = self.pool.get().await?;
        let rows = catalog::list_active_products(&mut conn, page.offset(), page.limit).await?;
        let total = catalog::count_active_products(&mut conn).await?;
        Ok((rows.into_iter().map(Into::into).collect(), page.meta(total)))
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(&self, id: i32, request: UpdateProductRequest) -> Result<ProductResponse> {
        require_name(&request.name)?;
        validate_price_and_stock(&request.price, request.stock)?;

        let mut conn = self.pool.get().await?;
        if catalog::find_category(&mut conn, request.category_id).await?.is_none() {
            return Err(ShopError::NotFound("category"));
        }

        let changes = ProductChangeset {
            category_id: request.category_id,
            name: request.name,
            description: request.description,
            price: request.price,
            stock: request.stock,
            is_active: request.is_active,
            updated_at: Utc::now(),
        };
        catalog::update_product(&mut conn, id, &changes)
            .await?
            .ok_or(ShopError::NotFound("product"))?;

        self.product_detail(&mut conn, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<()> {
        let mut conn = self.pool.get().await?;
        if !catalog::soft_delete_product(&mut conn, id).await? {
            return Err(ShopError::NotFound("product"));
        }
        info!("Deleted product");
        Ok(())
    }

    /// Records an image for the product; the first one becomes primary. The
    /// product row is locked so concurrent uploads agree on which is first.
    #[instrument(skip(self, url, alt_text))]
    pub async fn add_product_image(&self, product_id: i32, url: String, alt_text: String) -> Result<ProductImageResponse> {
        let mut conn = self.pool.get().await?;
        let image = conn
            .transaction::<_, ShopError, _>(|conn| {
                async move {
                    if catalog::lock_product(conn, product_id).await?.is_none() {
                        return Err(ShopError::NotFound("product"));
                    }

                    let existing = catalog::count_product_images(conn, product_id).await?;
                    catalog::create_product_image(
                        conn,
                        &NewProductImage {
                            product_id,
                            url,
                            alt_text,
                            is_primary: existing == 0,
                        },
                    )
                    .await
                }
                .scope_boxed()
            })
            .await?;
        Ok(image.into())
    }

    /// Stores the file, then records it. The file is removed again if the
    /// row cannot be written.
    #[instrument(skip(self, bytes, alt_text), fields(size = bytes.len()))]
    pub async fn upload_product_image(
        &self,
        product_id: i32,
        file_name: &str,
        bytes: &[u8],
        alt_text: String,
    ) -> Result<ProductImageResponse> {
        {
            let mut conn = self.pool.get().await?;
            if catalog::find_product(&mut conn, product_id).await?.is_none() {
                return Err(ShopError::NotFound("product"));
            }
        }

        let url = self.uploads.save_product_image(product_id, file_name, bytes).await?;
        match self.add_product_image(product_id, url.clone(), alt_text).await {
            Ok(image) => Ok(image),
            Err(err) => {
                if let Err(cleanup) = self.uploads.delete(&url).await {
                    warn!(error = %cleanup, %url, "Could not remove orphaned upload");
                }
                Err(err)
            }
        }
    }

    async fn product_detail(
        &self,
        conn: &mut diesel_async::AsyncPgConnection,
        id: i32,
    ) -> Result<ProductResponse> {
        let detail = catalog::find_product_detail(conn, id)
            .await?
            .ok_or(ShopError::NotFound("product"))?;
        Ok(detail.into())
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ShopError::validation("name is required"));
    }
    Ok(())
}

fn validate_price_and_stock(price: &BigDecimal, stock: i32) -> Result<()> {
    if *price <= BigDecimal::zero() {
        return Err(ShopError::validation("price must be greater than zero"));
    }
    if stock < 0 {
        return Err(ShopError::validation("stock cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn price_must_be_positive_and_stock_non_negative() {
        assert!(validate_price_and_stock(&BigDecimal::from_str("0.01").unwrap(), 0).is_ok());
        assert!(validate_price_and_stock(&BigDecimal::zero(), 3).is_err());
        assert!(validate_price_and_stock(&BigDecimal::from_str("-1").unwrap(), 3).is_err());
        assert!(validate_price_and_stock(&BigDecimal::from(5), -1).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(require_name("Mugs").is_ok());
        assert!(matches!(require_name("   "), Err(ShopError::Validation(_))));
    }
}
