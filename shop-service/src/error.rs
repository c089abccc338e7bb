use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::DatabaseErrorKind;
use shared::ApiResponse;
use thiserror::Error;

pub type Result<T, E = ShopError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("not enough stock for product: {product}")]
    InsufficientStock { product: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("you are not authorized to access this resource")]
    Forbidden,

    #[error("too many requests")]
    RateLimited { retry_after: Duration },

    /// Storage failure. The cause is logged, never sent to the client.
    #[error("persistence error: {0:#}")]
    Persistence(anyhow::Error),
}

impl ShopError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShopError::EmptyCart
            | ShopError::InsufficientStock { .. }
            | ShopError::Validation(_) => StatusCode::BAD_REQUEST,
            ShopError::NotFound(_) => StatusCode::NOT_FOUND,
            ShopError::Conflict(_) => StatusCode::CONFLICT,
            ShopError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ShopError::Forbidden => StatusCode::FORBIDDEN,
            ShopError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ShopError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ShopError::EmptyCart => "empty cart",
            ShopError::InsufficientStock { .. } => "insufficient stock",
            ShopError::NotFound(_) => "not found",
            ShopError::Validation(_) => "validation failed",
            ShopError::Conflict(_) => "conflict",
            ShopError::Unauthorized(_) => "unauthorized",
            ShopError::Forbidden => "forbidden",
            ShopError::RateLimited { .. } => "rate limited",
            ShopError::Persistence(_) => "internal server error",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ShopError::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ShopError::Unauthorized(msg.into())
    }
}

impl From<diesel::result::Error> for ShopError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => ShopError::NotFound("record"),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                ShopError::Conflict(format!("duplicate value violates {}", info.constraint_name().unwrap_or("a unique constraint")))
            }
            other => ShopError::Persistence(other.into()),
        }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for ShopError {
    fn from(err: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        ShopError::Persistence(anyhow::anyhow!("connection pool: {}", err))
    }
}

impl From<std::io::Error> for ShopError {
    fn from(err: std::io::Error) -> Self {
        ShopError::Persistence(err.into())
    }
}

impl From<tokio::time::error::Elapsed> for ShopError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ShopError::Persistence(anyhow::anyhow!("deadline exceeded, transaction rolled back"))
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ShopError::Persistence(cause) => {
                tracing::error!(error = %format!("{:#}", cause), "Request failed with an internal error");
                "an internal error occurred".to_string()
            }
            other => {
                tracing::warn!(error = %other, status = status.as_u16(), "Request rejected");
                other.to_string()
            }
        };

        let retry_after = match &self {
            ShopError::RateLimited { retry_after } => Some(retry_after.as_secs().max(1)),
            _ => None,
        };

        let mut response = (status, Json(ApiResponse::<()>::failed(message, self.kind()))).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
