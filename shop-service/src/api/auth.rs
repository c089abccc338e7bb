use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shared::{ApiResponse, AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest};

use super::AppState;
use crate::error::Result;

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let auth = state.auth.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered successfully", auth)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let auth = state.auth.login(request).await?;
    Ok(Json(ApiResponse::success("Login successful", auth)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let auth = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::success("Token refreshed successfully", auth)))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<()>>> {
    state.auth.logout(&request.refresh_token).await?;
    Ok(Json(ApiResponse::done("Logout successful")))
}
