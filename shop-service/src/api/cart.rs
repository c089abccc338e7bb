use axum::extract::{Path, State};
use axum::Json;
use shared::{AddToCartRequest, ApiResponse, CartResponse, UpdateCartItemRequest};

use super::AppState;
use crate::auth::AuthUser;
use crate::error::Result;

pub async fn get_cart(State(state): State<AppState>, user: AuthUser) -> Result<Json<ApiResponse<CartResponse>>> {
    let cart = state.carts.get_cart(user.id).await?;
    Ok(Json(ApiResponse::success("Cart retrieved successfully", cart)))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<CartResponse>>> {
    let cart = state.carts.add_to_cart(user.id, request).await?;
    Ok(Json(ApiResponse::success("Item added to cart successfully", cart)))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<i32>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<ApiResponse<CartResponse>>> {
    let cart = state.carts.update_cart_item(user.id, item_id, request).await?;
    Ok(Json(ApiResponse::success("Cart item updated successfully", cart)))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<i32>,
) -> Result<Json<ApiResponse<()>>> {
    state.carts.remove_from_cart(user.id, item_id).await?;
    Ok(Json(ApiResponse::done("Item removed from cart successfully")))
}
