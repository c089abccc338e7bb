use axum::extract::State;
use axum::Json;
use shared::{ApiResponse, UpdateProfileRequest, UserResponse};

use super::AppState;
use crate::auth::AuthUser;
use crate::error::Result;

pub async fn get_profile(State(state): State<AppState>, user: AuthUser) -> Result<Json<ApiResponse<UserResponse>>> {
    let profile = state.users.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success("Profile retrieved successfully", profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let profile = state.users.update_profile(user.id, request).await?;
    Ok(Json(ApiResponse::success("Profile updated successfully", profile)))
}
