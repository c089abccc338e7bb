use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use shared::{ApiResponse, OrderResponse, PageQuery, PaginatedResponse};

use super::AppState;
use crate::auth::AuthUser;
use crate::error::Result;
use crate::pagination::Page;

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>)> {
    let order = state.orders.place_order(user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order created successfully", order)),
    ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<OrderResponse>>> {
    let (orders, meta) = state.orders.list_orders(user.id, Page::from(query)).await?;
    Ok(Json(PaginatedResponse::new("Orders retrieved successfully", orders, meta)))
}

pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i32>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let order = state.orders.get_order(user.id, order_id).await?;
    Ok(Json(ApiResponse::success("Order retrieved successfully", order)))
}
