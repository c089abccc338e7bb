pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod repository;
pub mod schema;
pub mod services;
pub mod upload;
mod views;

use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub type DbPool = Pool<AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
