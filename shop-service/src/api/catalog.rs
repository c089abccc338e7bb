use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use shared::*;

use super::AppState;
use crate::auth::AdminUser;
use crate::error::{Result, ShopError};
use crate::pagination::Page;

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(ApiResponse::success("Categories retrieved successfully", categories)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CategoryResponse>>> {
    let category = state.catalog.get_category(id).await?;
    Ok(Json(ApiResponse::success("Category retrieved successfully", category)))
}

pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>)> {
    let category = state.catalog.create_category(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Category created successfully", category)),
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>> {
    let category = state.catalog.update_category(id, request).await?;
    Ok(Json(ApiResponse::success("Category updated successfully", category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>> {
    state.catalog.delete_category(id).await?;
    Ok(Json(ApiResponse::done("Category deleted successfully")))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<ProductResponse>>> {
    let (products, meta) = state.catalog.list_products(Page::from(query)).await?;
    Ok(Json(PaginatedResponse::new("Products retrieved successfully", products, meta)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProductResponse>>> {
    let product = state.catalog.get_product(id).await?;
    Ok(Json(ApiResponse::success("Product retrieved successfully", product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>)> {
    let product = state.catalog.create_product(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Product created successfully", product)),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>> {
    let product = state.catalog.update_product(id, request).await?;
    Ok(Json(ApiResponse::success("Product updated successfully", product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>> {
    state.catalog.delete_product(id).await?;
    Ok(Json(ApiResponse::done("Product deleted successfully")))
}

/// Multipart fields: `file` (required) and `alt_text`.
pub async fn upload_product_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ProductImageResponse>>)> {
    let mut file: Option<(String, Bytes)> = None;
    let mut alt_text = String::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ShopError::validation("file name is required"))?;
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some((file_name, bytes));
            }
            Some("alt_text") => alt_text = field.text().await.map_err(bad_multipart)?,
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ShopError::validation("image file is required"))?;
    let image = state
        .catalog
        .upload_product_image(id, &file_name, &bytes, alt_text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Image uploaded successfully", image)),
    ))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ShopError {
    ShopError::validation(format!("invalid multipart body: {}", err))
}
