mod auth;
mod cart;
mod catalog;
mod orders;
mod users;

use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use shared::ApiResponse;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::TokenKeys;
use crate::config::Config;
use crate::rate_limit::{limit_by_client, RateLimiter};
use crate::services::*;
use crate::upload::LocalUploadStore;
use crate::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub keys: TokenKeys,
    pub auth: AuthService,
    pub users: UserService,
    pub catalog: CatalogService,
    pub carts: CartService,
    pub orders: OrderService,
    pub uploads: LocalUploadStore,
    pub auth_limiter: RateLimiter,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        let keys = TokenKeys::new(&config.jwt());
        let uploads = LocalUploadStore::new(config.upload_dir.clone());

        Self {
            auth: AuthService::new(pool.clone(), keys.clone()),
            users: UserService::new(pool.clone()),
            catalog: CatalogService::new(pool.clone(), uploads.clone()),
            carts: CartService::new(pool.clone()),
            orders: OrderService::new(pool, config.checkout_timeout()),
            auth_limiter: RateLimiter::per_minute(config.auth_rate_limit_per_minute),
            keys,
            uploads,
        }
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            limit_by_client,
        ));

    let v1 = Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .route("/users/profile", get(users::get_profile).put(users::update_profile))
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route(
            "/categories/:id",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/products/:id",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/products/:id/images", post(catalog::upload_product_image))
        .route("/cart", get(cart::get_cart))
        .route("/cart/items", post(cart::add_to_cart))
        .route(
            "/cart/items/:id",
            put(cart::update_cart_item).delete(cart::remove_from_cart),
        )
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/:id", get(orders::get_order));

    let uploads = ServeDir::new(state.uploads.base_dir());

    Router::new()
        .nest("/v1", v1)
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success("Service is healthy", json!({ "status": "up" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use clap::Parser;
    use diesel_async::pooled_connection::AsyncDieselConnectionManager;
    use diesel_async::AsyncPgConnection;
    use shared::UserRole;
    use tower::ServiceExt;

    // The pool never connects unless a handler asks for a connection.
    fn test_app(rate_limit: u32) -> (Router, TokenKeys) {
        let rate_limit = rate_limit.to_string();
        let config = Config::try_parse_from([
            "shop-service",
            "--database-url",
            "postgres://nobody@127.0.0.1:1/none",
            "--jwt-secret",
            "router-test-secret",
            "--auth-rate-limit-per-minute",
            rate_limit.as_str(),
        ])
        .unwrap();
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let pool = bb8::Pool::builder()
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager);

        let state = AppState::new(pool, &config);
        let keys = state.keys.clone();
        (create_router(state), keys)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_reports_up() {
        let (app, _) = test_app(20);
        let request = Request::builder().uri("/v1/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "up");
    }

    #[tokio::test]
    async fn protected_routes_require_a_bearer_token() {
        for (method, uri) in [
            ("GET", "/v1/cart"),
            ("POST", "/v1/orders"),
            ("GET", "/v1/orders"),
            ("GET", "/v1/orders/1"),
            ("GET", "/v1/users/profile"),
        ] {
            let (app, _) = test_app(20);
            let (status, body) = send(app, json_request(method, uri, None, json!({}))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "unauthorized");
            assert!(body["data"].is_null());
        }
    }

    #[tokio::test]
    async fn catalog_mutations_are_admin_only() {
        let (app, keys) = test_app(20);
        let token = keys
            .issue_access_token(3, "buyer@shop.test", UserRole::Customer)
            .unwrap();

        let (status, body) = send(
            app,
            json_request("POST", "/v1/categories", Some(&token), json!({"name": "Mugs"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_storage() {
        let (app, _) = test_app(20);
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/v1/auth/register",
                None,
                json!({
                    "email": "new@shop.test",
                    "password": "short",
                    "first_name": "New",
                    "last_name": "User"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation failed");
    }

    #[tokio::test]
    async fn auth_routes_are_rate_limited() {
        let (app, _) = test_app(2);

        for _ in 0..2 {
            let request = json_request("POST", "/v1/auth/login", None, json!({}));
            let (status, _) = send(app.clone(), request).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }

        let response = app
            .oneshot(json_request("POST", "/v1/auth/login", None, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (app, _) = test_app(20);
        let request = Request::builder().uri("/v1/nope").body(Body::empty()).unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
