use chrono::Utc;
use shared::{UpdateProfileRequest, UserResponse};
use tracing::{info, instrument};

use crate::error::{Result, ShopError};
use crate::models::ProfileChangeset;
use crate::repository::users;
use crate::DbPool;

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: i32) -> Result<UserResponse> {
        let mut conn = self.pool.get().await?;
        let user = users::find_user(&mut conn, user_id)
            .await?
            .ok_or(ShopError::NotFound("user"))?;
        Ok(user.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_profile(&self, user_id: i32, request: UpdateProfileRequest) -> Result<UserResponse> {
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(ShopError::validation("first and last name are required"));
        }

        let changes = ProfileChangeset {
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            updated_at: Utc::now(),
        };

        let mut conn = self.pool.get().await?;
        let user = users::update_profile(&mut conn, user_id, &changes)
            .await?
            .ok_or(ShopError::NotFound("user"))?;

        info!("Updated profile");
        Ok(user.into())
    }
}
