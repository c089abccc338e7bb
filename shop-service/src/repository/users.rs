use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::Result;
use crate::models::*;
use crate::schema::*;

pub async fn create_user(conn: &mut AsyncPgConnection, new_user: &NewUser) -> Result<User> {
    let user = diesel::insert_into(users::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .await?;
    Ok(user)
}

pub async fn find_user(conn: &mut AsyncPgConnection, id: i32) -> Result<Option<User>> {
    let user = users::table
        .filter(users::id.eq(id))
        .filter(users::deleted_at.is_null())
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(user)
}

pub async fn find_user_by_email(conn: &mut AsyncPgConnection, email: &str) -> Result<Option<User>> {
    let user = users::table
        .filter(users::email.eq(email))
        .filter(users::deleted_at.is_null())
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(user)
}

pub async fn update_profile(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: &ProfileChangeset,
) -> Result<Option<User>> {
    let user = diesel::update(
        users::table
            .filter(users::id.eq(id))
            .filter(users::deleted_at.is_null()),
    )
    .set(changes)
    .returning(User::as_returning())
    .get_result(conn)
    .await
    .optional()?;
    Ok(user)
}

pub async fn create_refresh_token(conn: &mut AsyncPgConnection, token: &NewRefreshToken) -> Result<RefreshToken> {
    let token = diesel::insert_into(refresh_tokens::table)
        .values(token)
        .returning(RefreshToken::as_returning())
        .get_result(conn)
        .await?;
    Ok(token)
}

/// Looks up a refresh token that has not expired as of `now`.
pub async fn find_live_refresh_token(
    conn: &mut AsyncPgConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<RefreshToken>> {
    let token = refresh_tokens::table
        .filter(refresh_tokens::token.eq(token))
        .filter(refresh_tokens::expires_at.gt(now))
        .select(RefreshToken::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(token)
}

pub async fn delete_refresh_token(conn: &mut AsyncPgConnection, token: &str) -> Result<usize> {
    let deleted = diesel::delete(refresh_tokens::table.filter(refresh_tokens::token.eq(token)))
        .execute(conn)
        .await?;
    Ok(deleted)
}

pub async fn delete_expired_refresh_tokens(conn: &mut AsyncPgConnection, user_id: i32, now: DateTime<Utc>) -> Result<usize> {
    let deleted = diesel::delete(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .filter(refresh_tokens::expires_at.le(now)),
    )
    .execute(conn)
    .await?;
    Ok(deleted)
}
