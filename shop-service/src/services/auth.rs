use chrono::Utc;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use shared::{AuthResponse, LoginRequest, RegisterRequest, UserRole};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, TokenKeys};
use crate::error::{Result, ShopError};
use crate::models::{NewRefreshToken, NewUser, User};
use crate::repository::{carts, users};
use crate::DbPool;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(pool: DbPool, keys: TokenKeys) -> Self {
        Self { pool, keys }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        validate_registration(&request)?;

        let mut conn = self.pool.get().await?;
        if users::find_user_by_email(&mut conn, &request.email).await?.is_some() {
            return Err(ShopError::Conflict("email is already registered".to_string()));
        }

        let new_user = NewUser {
            email: request.email,
            password_hash: hash_password(&request.password)?,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            role: UserRole::Customer.as_str().to_string(),
        };

        let user = conn
            .transaction::<_, ShopError, _>(|conn| {
                async move {
                    let user = users::create_user(conn, &new_user).await?;
                    carts::create_cart(conn, user.id).await?;
                    Ok(user)
                }
                .scope_boxed()
            })
            .await?;

        info!(user_id = user.id, "Registered user");
        self.issue_tokens(&mut conn, user).await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let mut conn = self.pool.get().await?;

        let user = users::find_user_by_email(&mut conn, &request.email)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ShopError::unauthorized("invalid credentials"))?;

        if !verify_password(&user.password_hash, &request.password)? {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(ShopError::unauthorized("invalid credentials"));
        }

        self.issue_tokens(&mut conn, user).await
    }

    /// Exchanges a live refresh token for a new pair. The presented token is
    /// consumed.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse> {
        let mut conn = self.pool.get().await?;

        let stored = users::find_live_refresh_token(&mut conn, refresh_token, Utc::now())
            .await?
            .ok_or_else(|| ShopError::unauthorized("refresh token not found or expired"))?;

        let user = users::find_user(&mut conn, stored.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ShopError::unauthorized("account is not active"))?;

        if users::delete_refresh_token(&mut conn, &stored.token).await? == 0 {
            // lost a race with another refresh or a logout
            return Err(ShopError::unauthorized("refresh token not found or expired"));
        }

        self.issue_tokens(&mut conn, user).await
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;
        users::delete_refresh_token(&mut conn, refresh_token).await?;
        Ok(())
    }

    async fn issue_tokens(&self, conn: &mut AsyncPgConnection, user: User) -> Result<AuthResponse> {
        let role = user.role.parse().unwrap_or(UserRole::Customer);
        let access_token = self.keys.issue_access_token(user.id, &user.email, role)?;

        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.keys.refresh_ttl())
            .map_err(|e| ShopError::Persistence(anyhow::anyhow!("refresh ttl out of range: {}", e)))?;
        let refresh = users::create_refresh_token(
            conn,
            &NewRefreshToken {
                user_id: user.id,
                token: Uuid::new_v4().to_string(),
                expires_at: now + ttl,
            },
        )
        .await?;
        users::delete_expired_refresh_tokens(conn, user.id, now).await?;

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token: refresh.token,
        })
    }
}

fn validate_registration(request: &RegisterRequest) -> Result<()> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ShopError::validation("a valid email is required"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ShopError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        return Err(ShopError::validation("first and last name are required"));
    }
    Ok(())
}
